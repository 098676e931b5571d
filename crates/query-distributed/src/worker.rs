//! Execution site owning one plan cache

use crate::catalog::ProcedureCatalog;
use crate::messages::{WorkerHandle, WorkerMessage};
use crate::types::{SiteId, WorkerStats};
use query_cache::{
    CacheConfig, CacheStatistics, InvalidationEvent, PlanCache, PlanCompiler, ResolvedStatement,
};
use query_core::Value;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A partition site or the coordinator.
///
/// The worker owns its plan cache by value. Nothing else can reach the cache,
/// so all access is serialized through the worker's inbox.
pub struct Worker {
    /// Site id, -1 for the coordinator
    site: SiteId,
    /// Private plan cache
    cache: PlanCache,
    /// Plan compiler used on cache misses
    compiler: Arc<dyn PlanCompiler>,
    /// Deployed procedures
    catalog: Arc<ProcedureCatalog>,
    /// Version of the deployed catalog
    catalog_version: u64,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        site: SiteId,
        config: CacheConfig,
        compiler: Arc<dyn PlanCompiler>,
        catalog: Arc<ProcedureCatalog>,
    ) -> Self {
        Self {
            site,
            cache: PlanCache::new(config),
            compiler,
            catalog,
            catalog_version: 0,
        }
    }

    /// Get the site id
    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Get the deployed catalog version
    pub fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    /// Resolve an ad-hoc batch through this site's cache
    pub fn resolve(
        &mut self,
        batch: &str,
        args: &[Value],
    ) -> query_core::Result<Vec<ResolvedStatement>> {
        self.cache.resolve_batch(batch, args, self.compiler.as_ref())
    }

    /// Resolve exactly like [`Worker::resolve`] and describe the plans
    pub fn explain(&mut self, batch: &str, args: &[Value]) -> query_core::Result<Vec<String>> {
        let resolved = self.resolve(batch, args)?;
        Ok(resolved
            .iter()
            .map(|r| r.plan.explain().to_string())
            .collect())
    }

    /// Describe a catalog procedure. Never consults the plan cache.
    pub fn explain_procedure(&self, name: &str) -> Option<String> {
        self.catalog.get(name).map(|p| p.explain.clone())
    }

    /// Current cache counters
    pub fn statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    /// Current cache counters as a statistics row
    pub fn stats_row(&self) -> WorkerStats {
        WorkerStats::from_cache(self.site, &self.cache.statistics())
    }

    /// Clear this site's plan cache
    pub fn invalidate(&mut self, event: &InvalidationEvent) {
        tracing::info!("{} invalidating plan cache: {:?}", self.site, event);
        event.apply(&mut self.cache);
    }

    /// Deploy a new catalog; every cached plan is dropped
    pub fn update_catalog(&mut self, catalog: Arc<ProcedureCatalog>, version: u64) {
        self.catalog = catalog;
        self.catalog_version = version;
        self.invalidate(&InvalidationEvent::catalog_changed(version));
    }

    /// Handle one inbox message
    pub fn handle(&mut self, message: WorkerMessage) -> ControlFlow<()> {
        match message {
            WorkerMessage::Resolve { batch, args, reply } => {
                let _ = reply.send(self.resolve(&batch, &args));
            }
            WorkerMessage::Explain { batch, args, reply } => {
                let _ = reply.send(self.explain(&batch, &args));
            }
            WorkerMessage::ExplainProcedure { name, reply } => {
                let _ = reply.send(self.explain_procedure(&name));
            }
            WorkerMessage::Statistics { reply } => {
                let _ = reply.send(self.stats_row());
            }
            WorkerMessage::Invalidate(event) => self.invalidate(&event),
            WorkerMessage::CatalogUpdate { catalog, version } => {
                self.update_catalog(catalog, version)
            }
            WorkerMessage::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Process inbox messages until shutdown or until every sender is gone
    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<WorkerMessage>) {
        tracing::info!("Starting {}", self.site);

        while let Some(message) = inbox.recv().await {
            if self.handle(message).is_break() {
                break;
            }
        }

        tracing::info!("Stopped {}", self.site);
    }

    /// Start the worker on the current tokio runtime
    pub fn spawn(self) -> (WorkerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = WorkerHandle::new(self.site, tx);
        let join = tokio::spawn(self.run(rx));
        (handle, join)
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("site", &self.site)
            .field("cache", &self.cache)
            .field("catalog_version", &self.catalog_version)
            .finish()
    }
}
