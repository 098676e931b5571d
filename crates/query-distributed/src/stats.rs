//! Plan cache statistics across sites
//!
//! Rows are pulled from each site through its inbox. A site copies its
//! counters between two statements, so every row is a consistent snapshot of
//! that site. Rows of different sites are not taken at the same instant.

use crate::error::Result;
use crate::messages::{WorkerHandle, WorkerMessage};
use crate::types::WorkerStats;
use serde::{Deserialize, Serialize};

/// Answers plan cache statistics queries
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    partitions: Vec<WorkerHandle>,
    coordinator: WorkerHandle,
}

impl StatisticsAggregator {
    pub fn new(partitions: Vec<WorkerHandle>, coordinator: WorkerHandle) -> Self {
        Self {
            partitions,
            coordinator,
        }
    }

    /// One row per partition in partition order, then the coordinator's row
    /// (`worker_id = -1`). The coordinator row is its own cache, not a sum.
    pub async fn snapshot(&self) -> Result<Vec<WorkerStats>> {
        let mut rows = Vec::with_capacity(self.partitions.len() + 1);
        for handle in self.partitions.iter().chain(std::iter::once(&self.coordinator)) {
            let row = handle
                .request(|reply| WorkerMessage::Statistics { reply })
                .await?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Sum of every row, for display.
    pub fn totals(rows: &[WorkerStats]) -> StatsTotals {
        rows.iter().fold(StatsTotals::default(), |mut acc, row| {
            acc.level1 += row.level1;
            acc.level2 += row.level2;
            acc.hits1 += row.hits1;
            acc.hits2 += row.hits2;
            acc.misses += row.misses;
            acc.failures += row.failures;
            acc
        })
    }
}

/// Cluster-wide sums of the cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsTotals {
    pub level1: u64,
    pub level2: u64,
    pub hits1: u64,
    pub hits2: u64,
    pub misses: u64,
    pub failures: u64,
}
