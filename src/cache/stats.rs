//! Diagnostic snapshot of the cache namespace

use serde::Serialize;

/// Counts and sizes of the entries under the cache prefix
///
/// Entries that cannot be parsed are counted in `total_entries` and
/// `total_size_bytes` but are neither valid nor expired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Every storage key under the prefix
    pub total_entries: usize,
    /// Entries that would be served by `get`
    pub valid_entries: usize,
    /// Entries only reachable through `get_stale`
    pub expired_entries: usize,
    /// Byte length of storage keys plus stored values
    pub total_size_bytes: usize,
}

impl CacheStats {
    /// Entries that could not be parsed
    pub fn unreadable_entries(&self) -> usize {
        self.total_entries - self.valid_entries - self.expired_entries
    }
}
