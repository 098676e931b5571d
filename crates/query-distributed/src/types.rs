//! Core types for the plan cache cluster

use query_cache::{CacheConfig, CacheStatistics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an execution site: a partition, or the coordinator (-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(pub i32);

impl SiteId {
    /// The multi-partition coordinator
    pub const COORDINATOR: SiteId = SiteId(-1);

    /// Site owning partition `id`; `None` when the id does not fit a site id
    pub fn partition(id: u32) -> Option<Self> {
        i32::try_from(id).ok().map(Self)
    }

    pub fn is_coordinator(&self) -> bool {
        *self == Self::COORDINATOR
    }

    /// Partition id, `None` for the coordinator
    pub fn partition_id(&self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_coordinator() {
            write!(f, "coordinator")
        } else {
            write!(f, "site-{}", self.0)
        }
    }
}

/// Where a statement should be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteTarget {
    /// A single-partition statement routed to one partition
    Partition(u32),
    /// A multi-partition statement
    Coordinator,
}

impl fmt::Display for SiteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteTarget::Partition(id) => write!(f, "partition {}", id),
            SiteTarget::Coordinator => write!(f, "coordinator"),
        }
    }
}

/// One row of the plan cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Site id, -1 for the coordinator
    pub worker_id: i32,
    pub partition_id: Option<u32>,
    pub level1: u64,
    pub level2: u64,
    pub hits1: u64,
    pub hits2: u64,
    pub misses: u64,
    pub failures: u64,
    pub evictions1: u64,
    pub evictions2: u64,
    pub plan_time_min_ns: u64,
    pub plan_time_max_ns: u64,
    pub plan_time_avg_ns: u64,
}

impl WorkerStats {
    pub fn from_cache(site: SiteId, stats: &CacheStatistics) -> Self {
        let plan_time = stats.plan_time();
        Self {
            worker_id: site.0,
            partition_id: site.partition_id(),
            level1: stats.level1(),
            level2: stats.level2(),
            hits1: stats.hits1(),
            hits2: stats.hits2(),
            misses: stats.misses(),
            failures: stats.failures(),
            evictions1: stats.evictions1(),
            evictions2: stats.evictions2(),
            plan_time_min_ns: plan_time.min_ns(),
            plan_time_max_ns: plan_time.max_ns(),
            plan_time_avg_ns: plan_time.avg_ns(),
        }
    }

    pub fn is_coordinator(&self) -> bool {
        self.worker_id == SiteId::COORDINATOR.0
    }

    /// Fraction of cache-path resolutions served from either level
    pub fn hit_rate(&self) -> f64 {
        let hits = (self.hits1 + self.hits2) as f64;
        let total = hits + self.misses as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }
}

/// Configuration for the plan cache cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of partition sites
    pub partitions: u32,
    /// Plan cache configuration of every partition site
    pub cache: CacheConfig,
    /// Plan cache configuration of the coordinator
    pub coordinator_cache: CacheConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            partitions: 2,
            cache: CacheConfig::default(),
            coordinator_cache: CacheConfig::default(),
        }
    }
}

impl ClusterConfig {
    /// Set the number of partition sites
    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions;
        self
    }

    /// Use `cache` for every site, coordinator included
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self.coordinator_cache = cache;
        self
    }

    /// Override the coordinator's cache configuration
    pub fn with_coordinator_cache(mut self, cache: CacheConfig) -> Self {
        self.coordinator_cache = cache;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_ids() {
        assert!(SiteId::COORDINATOR.is_coordinator());
        assert_eq!(SiteId::COORDINATOR.partition_id(), None);
        assert_eq!(SiteId(3).partition_id(), Some(3));
        assert_eq!(SiteId(3).to_string(), "site-3");
        assert_eq!(SiteId::partition(3), Some(SiteId(3)));
        assert_eq!(SiteId::partition(i32::MAX as u32), Some(SiteId(i32::MAX)));
        assert_eq!(SiteId::partition(u32::MAX), None);
        assert_eq!(SiteId::COORDINATOR.to_string(), "coordinator");
    }

    #[test]
    fn test_stats_row_from_cache() {
        let mut stats = CacheStatistics::new();
        stats.set_levels(2, 1);
        stats.record_hit1();
        stats.record_miss();

        let row = WorkerStats::from_cache(SiteId::COORDINATOR, &stats);
        assert!(row.is_coordinator());
        assert_eq!(row.partition_id, None);
        assert_eq!((row.level1, row.level2, row.hits1, row.misses), (2, 1, 1, 1));
        assert!((row.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_row_serializes_field_names() {
        let row = WorkerStats::from_cache(SiteId(0), &CacheStatistics::new());
        let json = serde_json::to_value(&row).unwrap();
        for field in ["worker_id", "level1", "level2", "hits1", "hits2", "misses"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_cluster_config_builder() {
        let config = ClusterConfig::default()
            .with_partitions(4)
            .with_cache(CacheConfig::new(10, 10))
            .with_coordinator_cache(CacheConfig::disabled());

        assert_eq!(config.partitions, 4);
        assert_eq!(config.cache, CacheConfig::new(10, 10));
        assert!(config.coordinator_cache.is_disabled());
    }
}
