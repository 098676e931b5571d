pub mod error;
pub mod types;

pub use error::{CompileError, ParamArityError, ResolveError, Result};
pub use types::*;
