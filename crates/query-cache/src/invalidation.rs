//! Cache invalidation support
//!
//! Schema or catalog changes make every cached plan suspect. The change is
//! announced as an event delivered to each plan cache owner, which then
//! clears its own cache; there is no shared version counter to compare on
//! lookup.

use crate::plan_cache::PlanCache;
use serde::{Deserialize, Serialize};

/// Trait for components that fan an invalidation out to plan caches
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate every plan cache reachable from this invalidator
    fn invalidate_all(&self);
}

/// Events that trigger plan cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationEvent {
    /// A new catalog version was deployed
    CatalogChanged { version: u64 },
    /// A table's definition changed
    SchemaChanged { table_name: String },
    /// Force invalidation of everything
    InvalidateAll,
}

impl InvalidationEvent {
    /// Create a catalog change event
    pub fn catalog_changed(version: u64) -> Self {
        Self::CatalogChanged { version }
    }

    /// Create a schema change event
    pub fn schema_changed(table_name: impl Into<String>) -> Self {
        Self::SchemaChanged {
            table_name: table_name.into(),
        }
    }

    /// Apply this event to a plan cache.
    ///
    /// Plans do not record the tables they read, so every event clears both
    /// levels.
    pub fn apply(&self, cache: &mut PlanCache) {
        tracing::debug!("Applying invalidation event {:?}", self);
        cache.invalidate_all();
    }
}
