//! Plan cache statistics tracking

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters for one worker's plan cache.
///
/// `level1`/`level2` are live entry counts; everything else is cumulative
/// and survives invalidation. The owning worker is the only writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatistics {
    level1: u64,
    level2: u64,
    hits1: u64,
    hits2: u64,
    /// Resolutions that hit neither level, failed ones included
    misses: u64,
    /// Compile failures and arity errors, a subset of `misses`
    failures: u64,
    evictions1: u64,
    evictions2: u64,
    plan_time: PlanTime,
}

/// Min/max/mean time spent in successful compiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTime {
    count: u64,
    total_ns: u64,
    min_ns: u64,
    max_ns: u64,
}

impl PlanTime {
    fn record(&mut self, elapsed: Duration) {
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.min_ns = if self.count == 0 { ns } else { self.min_ns.min(ns) };
        self.max_ns = self.max_ns.max(ns);
        self.total_ns = self.total_ns.saturating_add(ns);
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min_ns(&self) -> u64 {
        self.min_ns
    }

    pub fn max_ns(&self) -> u64 {
        self.max_ns
    }

    pub fn avg_ns(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.total_ns / self.count
        }
    }
}

impl CacheStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit1(&mut self) {
        self.hits1 += 1;
    }

    pub fn record_hit2(&mut self) {
        self.hits2 += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// A miss that ended without a plan
    pub fn record_failure(&mut self) {
        self.misses += 1;
        self.failures += 1;
    }

    pub fn record_eviction1(&mut self) {
        self.evictions1 += 1;
    }

    pub fn record_eviction2(&mut self) {
        self.evictions2 += 1;
    }

    pub fn record_plan_time(&mut self, elapsed: Duration) {
        self.plan_time.record(elapsed);
    }

    pub fn set_levels(&mut self, level1: usize, level2: usize) {
        self.level1 = level1 as u64;
        self.level2 = level2 as u64;
    }

    pub fn level1(&self) -> u64 {
        self.level1
    }

    pub fn level2(&self) -> u64 {
        self.level2
    }

    pub fn hits1(&self) -> u64 {
        self.hits1
    }

    pub fn hits2(&self) -> u64 {
        self.hits2
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn evictions1(&self) -> u64 {
        self.evictions1
    }

    pub fn evictions2(&self) -> u64 {
        self.evictions2
    }

    pub fn plan_time(&self) -> PlanTime {
        self.plan_time
    }

    /// Resolutions that went through the cache (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits1 + self.hits2 + self.misses
    }

    /// Fraction of cache-path resolutions served from either level (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests() as f64;
        if total == 0.0 {
            0.0
        } else {
            (self.hits1 + self.hits2) as f64 / total
        }
    }
}
