//! SQL text handling for the ad-hoc plan cache
//!
//! Nothing here understands SQL grammar. Everything works on a lexical scan
//! that knows about quotes, comments, numeric literal forms and `?` markers:
//!
//! - [`splitter`]: break a batch into statements on `;` boundaries
//! - [`binder`]: count `?` markers and check arity against supplied arguments
//! - [`parameterizer`]: lift literal constants out into typed parameter slots

pub mod binder;
pub mod lexer;
pub mod parameterizer;
pub mod splitter;

pub use binder::{bind, BoundArgs};
pub use lexer::{Lexer, ScanError, Token, TokenKind};
pub use parameterizer::{parameterize, Parameterized};
pub use splitter::{split, terminated_before, SplitBatch, Statement};
