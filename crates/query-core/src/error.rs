use thiserror::Error;

/// The number of `?` markers in a statement did not match the supplied arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Incorrect number of parameters passed: expected {expected}, passed {actual}")]
pub struct ParamArityError {
    pub expected: usize,
    pub actual: usize,
}

/// Opaque failure reported by the plan compiler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Compile error: {message}")]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    ParamArity(#[from] ParamArityError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Scan error: {0}")]
    Scan(String),
}

impl ResolveError {
    /// True when the statement was rejected before any cache level was consulted.
    pub fn is_arity(&self) -> bool {
        matches!(self, ResolveError::ParamArity(_))
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
