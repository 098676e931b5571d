use query_cache::{CompiledPlan, PlanCompiler};
use query_core::{CompileError, TypeSignature};
use query_parser::Statement;

/// Lexical stand-in for a real planner.
///
/// Accepts any statement starting with a query or DML keyword and describes
/// it as a single plan node. Everything else is a compile error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellCompiler;

impl PlanCompiler for ShellCompiler {
    fn compile(
        &self,
        canonical: &str,
        signature: &TypeSignature,
    ) -> Result<CompiledPlan, CompileError> {
        let statement =
            Statement::new(canonical).map_err(|e| CompileError::new(e.to_string()))?;

        let keyword = statement
            .leading_keyword()
            .ok_or_else(|| CompileError::new("empty statement"))?;

        let node = match keyword.as_str() {
            "SELECT" | "WITH" => "SEQUENTIAL SCAN",
            "INSERT" | "UPSERT" => "INSERT",
            "UPDATE" => "UPDATE",
            "DELETE" => "DELETE",
            _ => {
                return Err(CompileError::new(format!(
                    "unexpected token: {}",
                    keyword
                )))
            }
        };

        let explain = if signature.is_empty() {
            format!("{} for {}", node, canonical)
        } else {
            format!("{} for {} with parameters {}", node, canonical, signature)
        };
        Ok(CompiledPlan::new(canonical, signature.clone(), explain))
    }
}
