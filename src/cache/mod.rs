//! Cache module for storing API responses
//!
//! This module provides a cache manager that persists API responses on a
//! capacity-limited storage medium with configurable TTL (time-to-live)
//! values. It supports graceful degradation: expired entries stay readable
//! through `get_stale`, so the application can use stale data when APIs are
//! unavailable, and a missing or full medium never surfaces as an error.

mod clock;
mod manager;
mod stats;
mod storage;


pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheManager, DEFAULT_PREFIX, DEFAULT_TTL};
pub use stats::CacheStats;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, DEFAULT_CAPACITY_BYTES};
