//! Ad-hoc SQL Plan Cache for Query Engine
//!
//! This crate turns raw SQL text into reusable compiled plans while keeping
//! exact per-worker statistics.
//!
//! # Features
//!
//! - **Literal level (L1)**: exact statement text → plan, only for statements
//!   without user `?` markers
//! - **Parameterized level (L2)**: (canonical text, type signature) → plan;
//!   literal constants are lifted into typed slots so statements differing
//!   only in constant values share a plan
//! - **LRU Eviction**: each level is bounded independently; capacity zero disables it
//! - **Statistics**: live level sizes plus cumulative hits, misses, failures,
//!   evictions and plan time
//! - **Invalidation**: catalog changes clear both levels without touching
//!   cumulative counters
//!
//! # Example
//!
//! ```ignore
//! use query_cache::{CacheConfig, PlanCache};
//!
//! let mut cache = PlanCache::new(CacheConfig::default());
//!
//! // First call compiles, the second hits the literal level.
//! cache.resolve_batch("SELECT ID FROM R1 WHERE ID > 1;", &[], &compiler)?;
//! cache.resolve_batch("SELECT ID FROM R1 WHERE ID > 1;", &[], &compiler)?;
//!
//! assert_eq!(cache.statistics().hits1(), 1);
//! ```

pub mod compiler;
pub mod config;
pub mod invalidation;
pub mod level;
pub mod plan_cache;
pub mod stats;

pub use compiler::{CompiledPlan, PlanCompiler, PlanHandle};
pub use config::CacheConfig;
pub use invalidation::{CacheInvalidator, InvalidationEvent};
pub use level::{Admission, CachedPlan, ParamKey, PlanLevel};
pub use plan_cache::{Classification, PlanCache, ResolvedStatement};
pub use stats::{CacheStatistics, PlanTime};
