//! Seam to the external plan compiler

use query_core::{CompileError, TypeSignature};
use std::fmt;
use std::sync::Arc;

/// An executable plan produced by the compiler.
///
/// The cache treats the plan as opaque; it only needs the text and signature
/// it was compiled for, plus a description for explain output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPlan {
    canonical: String,
    signature: TypeSignature,
    explain: String,
}

impl CompiledPlan {
    pub fn new(
        canonical: impl Into<String>,
        signature: TypeSignature,
        explain: impl Into<String>,
    ) -> Self {
        Self {
            canonical: canonical.into(),
            signature,
            explain: explain.into(),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn signature(&self) -> &TypeSignature {
        &self.signature
    }

    pub fn explain(&self) -> &str {
        &self.explain
    }
}

impl fmt::Display for CompiledPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.canonical, self.signature)
    }
}

/// Shared read-only handle to a cached plan, valid for one execution.
pub type PlanHandle = Arc<CompiledPlan>;

/// Compiles parameterized SQL text for a given parameter type signature.
pub trait PlanCompiler: Send + Sync {
    fn compile(
        &self,
        canonical: &str,
        signature: &TypeSignature,
    ) -> Result<CompiledPlan, CompileError>;
}

impl<F> PlanCompiler for F
where
    F: Fn(&str, &TypeSignature) -> Result<CompiledPlan, CompileError> + Send + Sync,
{
    fn compile(
        &self,
        canonical: &str,
        signature: &TypeSignature,
    ) -> Result<CompiledPlan, CompileError> {
        self(canonical, signature)
    }
}
