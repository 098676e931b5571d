//! Partition sites plus one coordinator, each with a private plan cache

use crate::catalog::ProcedureCatalog;
use crate::error::{ClusterError, Result};
use crate::messages::{WorkerHandle, WorkerMessage};
use crate::stats::StatisticsAggregator;
use crate::types::{ClusterConfig, SiteId, SiteTarget, WorkerStats};
use crate::worker::Worker;
use parking_lot::Mutex;
use query_cache::{CacheInvalidator, InvalidationEvent, PlanCompiler, ResolvedStatement};
use query_core::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Routes ad-hoc statements to sites and fans out catalog events
pub struct Cluster {
    /// Partition sites, indexed by partition id
    partitions: Vec<WorkerHandle>,
    /// Multi-partition coordinator
    coordinator: WorkerHandle,
    /// Statistics query surface
    aggregator: StatisticsAggregator,
    /// Cluster configuration
    config: ClusterConfig,
    /// Last deployed catalog version
    catalog_version: AtomicU64,
    /// Site tasks, taken on shutdown
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Cluster {
    /// Spawn every site on the current tokio runtime
    pub fn start(
        config: ClusterConfig,
        compiler: Arc<dyn PlanCompiler>,
        catalog: ProcedureCatalog,
    ) -> Result<Self> {
        if config.partitions == 0 {
            return Err(ClusterError::InvalidConfig(
                "at least one partition is required".to_string(),
            ));
        }
        if SiteId::partition(config.partitions - 1).is_none() {
            return Err(ClusterError::InvalidConfig(format!(
                "{} partitions exceed the largest site id",
                config.partitions
            )));
        }

        let catalog = Arc::new(catalog);
        let mut tasks = Vec::with_capacity(config.partitions as usize + 1);

        let mut partitions = Vec::with_capacity(config.partitions as usize);
        for id in 0..config.partitions {
            let site = SiteId::partition(id).ok_or(ClusterError::UnknownPartition(id))?;
            let worker = Worker::new(
                site,
                config.cache,
                Arc::clone(&compiler),
                Arc::clone(&catalog),
            );
            let (handle, task) = worker.spawn();
            partitions.push(handle);
            tasks.push(task);
        }

        let coordinator = Worker::new(
            SiteId::COORDINATOR,
            config.coordinator_cache,
            compiler,
            catalog,
        );
        let (coordinator, task) = coordinator.spawn();
        tasks.push(task);

        tracing::info!(
            "Started plan cache cluster with {} partitions",
            config.partitions
        );

        let aggregator = StatisticsAggregator::new(partitions.clone(), coordinator.clone());
        Ok(Self {
            partitions,
            coordinator,
            aggregator,
            config,
            catalog_version: AtomicU64::new(0),
            tasks: Mutex::new(tasks),
        })
    }

    fn site(&self, target: SiteTarget) -> Result<&WorkerHandle> {
        match target {
            SiteTarget::Coordinator => Ok(&self.coordinator),
            SiteTarget::Partition(id) => self
                .partitions
                .get(id as usize)
                .ok_or(ClusterError::UnknownPartition(id)),
        }
    }

    /// Resolve an ad-hoc batch on one site
    pub async fn resolve(
        &self,
        target: SiteTarget,
        batch: &str,
        args: &[Value],
    ) -> Result<Vec<ResolvedStatement>> {
        let handle = self.site(target)?;
        let resolved = handle
            .request(|reply| WorkerMessage::Resolve {
                batch: batch.to_string(),
                args: args.to_vec(),
                reply,
            })
            .await??;
        Ok(resolved)
    }

    /// Resolve through the cache like execution does and describe the plans
    pub async fn explain(
        &self,
        target: SiteTarget,
        batch: &str,
        args: &[Value],
    ) -> Result<Vec<String>> {
        let handle = self.site(target)?;
        let plans = handle
            .request(|reply| WorkerMessage::Explain {
                batch: batch.to_string(),
                args: args.to_vec(),
                reply,
            })
            .await??;
        Ok(plans)
    }

    /// Describe a catalog procedure; plan cache counters are not touched
    pub async fn explain_procedure(&self, name: &str) -> Result<String> {
        self.coordinator
            .request(|reply| WorkerMessage::ExplainProcedure {
                name: name.to_string(),
                reply,
            })
            .await?
            .ok_or_else(|| ClusterError::UnknownProcedure(name.to_string()))
    }

    /// Plan cache statistics: one row per partition, then the coordinator
    pub async fn statistics(&self) -> Result<Vec<WorkerStats>> {
        self.aggregator.snapshot().await
    }

    /// Deploy a new catalog to every site; all cached plans are dropped
    pub fn update_catalog(&self, catalog: ProcedureCatalog) -> Result<u64> {
        let version = self.catalog_version.fetch_add(1, Ordering::AcqRel) + 1;
        let catalog = Arc::new(catalog);
        for handle in self.all_sites() {
            handle.send(WorkerMessage::CatalogUpdate {
                catalog: Arc::clone(&catalog),
                version,
            })?;
        }
        tracing::info!("Deployed catalog version {}", version);
        Ok(version)
    }

    /// Broadcast an invalidation event to every site
    pub fn broadcast(&self, event: InvalidationEvent) -> Result<()> {
        for handle in self.all_sites() {
            handle.send(WorkerMessage::Invalidate(event.clone()))?;
        }
        Ok(())
    }

    fn all_sites(&self) -> impl Iterator<Item = &WorkerHandle> {
        self.partitions
            .iter()
            .chain(std::iter::once(&self.coordinator))
    }

    /// Stop every site and wait for its task to finish
    pub async fn shutdown(&self) {
        for handle in self.all_sites() {
            // A site that already stopped has nothing left to drain.
            let _ = handle.send(WorkerMessage::Shutdown);
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Site task ended abnormally: {}", e);
            }
        }
        tracing::info!("Plan cache cluster stopped");
    }

    /// Get cluster config
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Get number of partition sites
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Get the last deployed catalog version
    pub fn catalog_version(&self) -> u64 {
        self.catalog_version.load(Ordering::Acquire)
    }
}

impl CacheInvalidator for Cluster {
    fn invalidate_all(&self) {
        if let Err(e) = self.broadcast(InvalidationEvent::InvalidateAll) {
            tracing::warn!("Invalidation not delivered: {}", e);
        }
    }
}
