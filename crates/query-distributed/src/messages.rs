//! Messages delivered to a site's inbox
//!
//! Every interaction with a site goes through its inbox, so requests are
//! handled one at a time in arrival order. An invalidation sent before a
//! resolve is always applied before that resolve runs.

use crate::catalog::ProcedureCatalog;
use crate::types::{SiteId, WorkerStats};
use query_cache::{InvalidationEvent, ResolvedStatement};
use query_core::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Requests handled by a site
#[derive(Debug)]
pub enum WorkerMessage {
    /// Resolve an ad-hoc batch through the site's plan cache
    Resolve {
        batch: String,
        args: Vec<Value>,
        reply: oneshot::Sender<query_core::Result<Vec<ResolvedStatement>>>,
    },
    /// Resolve like `Resolve` and describe the resulting plans
    Explain {
        batch: String,
        args: Vec<Value>,
        reply: oneshot::Sender<query_core::Result<Vec<String>>>,
    },
    /// Describe a catalog procedure without touching the plan cache
    ExplainProcedure {
        name: String,
        reply: oneshot::Sender<Option<String>>,
    },
    /// Copy the site's cache counters
    Statistics {
        reply: oneshot::Sender<WorkerStats>,
    },
    /// Clear the site's plan cache
    Invalidate(InvalidationEvent),
    /// Swap in a new catalog and clear the plan cache
    CatalogUpdate {
        catalog: Arc<ProcedureCatalog>,
        version: u64,
    },
    /// Stop the site's task
    Shutdown,
}

/// Sending side of a site's inbox
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    site: SiteId,
    sender: mpsc::UnboundedSender<WorkerMessage>,
}

impl WorkerHandle {
    pub fn new(site: SiteId, sender: mpsc::UnboundedSender<WorkerMessage>) -> Self {
        Self { site, sender }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Deliver a message without waiting for a reply
    pub fn send(&self, message: WorkerMessage) -> crate::Result<()> {
        self.sender
            .send(message)
            .map_err(|_| crate::ClusterError::WorkerStopped(self.site))
    }

    /// Deliver a message carrying a reply channel and wait for the answer
    pub async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> WorkerMessage,
    ) -> crate::Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx))?;
        rx.await
            .map_err(|_| crate::ClusterError::WorkerStopped(self.site))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
