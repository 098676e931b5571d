//! Catalog-defined procedures
//!
//! Procedures are compiled when the catalog is deployed, not through the
//! ad-hoc plan cache. Explaining one only reads its stored plan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A catalog procedure with its precompiled plan description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub statements: Vec<String>,
    pub explain: String,
}

impl Procedure {
    pub fn new(name: impl Into<String>, statements: Vec<String>, explain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements,
            explain: explain.into(),
        }
    }
}

/// Deployed procedures, looked up case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureCatalog {
    procedures: HashMap<String, Procedure>,
}

impl ProcedureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_procedure(mut self, procedure: Procedure) -> Self {
        self.register(procedure);
        self
    }

    pub fn register(&mut self, procedure: Procedure) {
        self.procedures
            .insert(procedure.name.to_ascii_uppercase(), procedure);
    }

    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(&name.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Procedure names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.procedures.values().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}
