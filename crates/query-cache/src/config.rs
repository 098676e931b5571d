//! Plan cache configuration options

use serde::{Deserialize, Serialize};

/// Default entry capacity of each cache level
pub const DEFAULT_LEVEL_CAPACITY: usize = 1000;

/// Configuration for one worker's plan cache
///
/// Each level has its own capacity. A capacity of zero means that level
/// never stores anything, which is a valid setup and not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum entries in the literal (exact text) level
    pub literal_capacity: usize,
    /// Maximum entries in the parameterized level
    pub parameterized_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            literal_capacity: DEFAULT_LEVEL_CAPACITY,
            parameterized_capacity: DEFAULT_LEVEL_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with explicit per-level capacities
    pub fn new(literal_capacity: usize, parameterized_capacity: usize) -> Self {
        Self {
            literal_capacity,
            parameterized_capacity,
        }
    }

    /// A configuration that never caches: every resolution compiles
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    /// Set the literal level capacity
    pub fn with_literal_capacity(mut self, capacity: usize) -> Self {
        self.literal_capacity = capacity;
        self
    }

    /// Set the parameterized level capacity
    pub fn with_parameterized_capacity(mut self, capacity: usize) -> Self {
        self.parameterized_capacity = capacity;
        self
    }

    /// True when neither level can hold an entry
    pub fn is_disabled(&self) -> bool {
        self.literal_capacity == 0 && self.parameterized_capacity == 0
    }
}
