//! Per-site plan caches for Query Engine
//!
//! Every partition site and the multi-partition coordinator owns a private
//! plan cache. No cache is shared between sites, so the cache itself never
//! takes a lock.
//!
//! # Architecture
//!
//! - **Worker**: one per partition plus one coordinator; a tokio task that
//!   owns its `PlanCache` and serves requests from its inbox
//! - **Cluster**: starts the sites, routes statements, broadcasts catalog
//!   changes and invalidations
//! - **StatisticsAggregator**: pulls one statistics row per site by message
//!
//! # Example
//!
//! ```ignore
//! use query_distributed::{Cluster, ClusterConfig, ProcedureCatalog, SiteTarget};
//!
//! let cluster = Cluster::start(ClusterConfig::default(), compiler, ProcedureCatalog::new())?;
//!
//! cluster.resolve(SiteTarget::Partition(0), "SELECT ID FROM R1 WHERE ID > ?;", &[Value::Integer(1)]).await?;
//!
//! for row in cluster.statistics().await? {
//!     println!("{} {} {}", row.worker_id, row.level2, row.misses);
//! }
//! ```
//!
//! # Modules
//!
//! - [`worker`]: site owning one plan cache
//! - [`cluster`]: site startup, routing and fan-out
//! - [`stats`]: statistics query surface
//! - [`messages`]: site inbox protocol
//! - [`catalog`]: catalog procedures for explain

pub mod catalog;
pub mod cluster;
pub mod error;
pub mod messages;
pub mod stats;
pub mod types;
pub mod worker;

// Re-exports
pub use catalog::{Procedure, ProcedureCatalog};
pub use cluster::Cluster;
pub use error::{ClusterError, Result};
pub use messages::{WorkerHandle, WorkerMessage};
pub use stats::{StatisticsAggregator, StatsTotals};
pub use types::*;
pub use worker::Worker;
