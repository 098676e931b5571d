//! Error types for the plan cache cluster

use crate::types::SiteId;
use thiserror::Error;

/// Errors that can occur while routing work to cache owners
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// No partition with this id
    #[error("Unknown partition: {0}")]
    UnknownPartition(u32),

    /// The site's task has exited and no longer accepts requests
    #[error("Site stopped: {0}")]
    WorkerStopped(SiteId),

    /// No catalog procedure with this name
    #[error("Procedure not found: {0}")]
    UnknownProcedure(String),

    /// Invalid cluster configuration
    #[error("Invalid cluster configuration: {0}")]
    InvalidConfig(String),

    /// Statement resolution failed
    #[error(transparent)]
    Resolve(#[from] query_core::ResolveError),
}

/// Result type for cluster operations
pub type Result<T> = std::result::Result<T, ClusterError>;
