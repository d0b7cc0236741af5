//! Cache manager for persisting API responses
//!
//! Provides a `CacheManager` that stores serializable data on a [`Storage`]
//! medium with expiry timestamps, supporting graceful degradation when APIs
//! are unavailable.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::clock::{duration_millis, Clock, SystemClock};
use super::stats::CacheStats;
use super::storage::{Storage, StorageError};

/// Prefix put in front of every cache key in the storage medium
pub const DEFAULT_PREFIX: &str = "tickercache_";

/// How long entries stay fresh unless a TTL is given (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Wrapper struct for cached data stored in the medium
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry<T> {
    /// The logical cache key, without prefix
    key: String,
    /// The cached data
    data: T,
    /// When the data was cached, epoch milliseconds
    timestamp: i64,
    /// When the cache entry expires, epoch milliseconds
    expires_at: i64,
}

/// Just enough of an entry to decide whether it has expired
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryHeader {
    expires_at: i64,
}

/// TTL key/value cache over a storage medium
///
/// Every operation is infallible from the caller's point of view: a missing
/// medium, an unparseable entry or a full medium all degrade to "not cached".
/// Clones share the same medium.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// `None` when no storage medium could be found
    storage: Option<Arc<dyn Storage>>,
    prefix: String,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheManager {
    /// Creates a cache manager over `storage` with the default prefix and TTL
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a cache manager with no storage medium
    ///
    /// Reads always miss and writes are dropped.
    pub fn unavailable() -> Self {
        Self {
            storage: None,
            prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL,
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the namespace prefix for storage keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the TTL used by [`CacheManager::set`]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Replaces the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether a storage medium is attached
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Every storage key under the prefix
    fn namespaced_keys(&self, storage: &dyn Storage) -> Vec<String> {
        storage
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect()
    }

    fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let storage = self.storage.as_ref()?;
        let raw = storage.get_item(&self.storage_key(key))?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(key, error = %e, "cache entry unreadable");
                None
            }
        }
    }

    /// Returns the cached data for `key` if it exists and has not expired
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.read_entry::<T>(key)?;
        if self.clock.now_millis() < entry.expires_at {
            debug!(key, "cache hit");
            Some(entry.data)
        } else {
            debug!(key, "cache entry expired");
            None
        }
    }

    /// Returns the cached data for `key` whether or not it has expired
    ///
    /// Only meant for serving something when a fresh fetch failed.
    pub fn get_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read_entry::<T>(key).map(|entry| entry.data)
    }

    /// Writes data to the cache with the default TTL
    pub fn set<T: Serialize>(&self, key: &str, data: &T) {
        self.set_with_ttl(key, data, self.default_ttl);
    }

    /// Writes data to the cache with a specified TTL
    ///
    /// The write is best-effort. When the medium is full, expired entries are
    /// swept to make room for later writes and this one is dropped.
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "coin:bitcoin")
    /// * `data` - The data to cache
    /// * `ttl` - How long the entry should be considered fresh; must be non-zero
    pub fn set_with_ttl<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        let Some(storage) = &self.storage else {
            return;
        };

        let ttl_millis = duration_millis(ttl);
        if ttl_millis <= 0 {
            warn!(key, "refusing to cache with a zero TTL");
            return;
        }

        let now = self.clock.now_millis();
        let entry = CacheEntry {
            key: key.to_string(),
            data,
            timestamp: now,
            expires_at: now.saturating_add(ttl_millis),
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        match storage.set_item(&self.storage_key(key), &json) {
            Ok(()) => debug!(key, ttl_ms = ttl_millis, "cached"),
            Err(e @ StorageError::QuotaExceeded { .. }) => {
                warn!(key, error = %e, "cache full, sweeping expired entries");
                self.sweep_expired();
            }
            Err(e) => warn!(key, error = %e, "failed to write cache entry"),
        }
    }

    /// Whether `key` has an entry that [`CacheManager::get`] would return
    pub fn is_valid(&self, key: &str) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        storage
            .get_item(&self.storage_key(key))
            .and_then(|raw| serde_json::from_str::<EntryHeader>(&raw).ok())
            .is_some_and(|header| self.clock.now_millis() < header.expires_at)
    }

    /// Removes the entry for `key`; a missing entry is not an error
    pub fn invalidate(&self, key: &str) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = storage.remove_item(&self.storage_key(key)) {
            warn!(key, error = %e, "failed to invalidate cache entry");
        }
    }

    /// Removes every entry under the prefix, returning how many were removed
    ///
    /// Storage keys outside the prefix are left alone.
    pub fn clear_all(&self) -> usize {
        let Some(storage) = &self.storage else {
            return 0;
        };

        let removed = self
            .namespaced_keys(storage.as_ref())
            .into_iter()
            .filter(|k| match storage.remove_item(k) {
                Ok(()) => true,
                Err(e) => {
                    warn!(key = %k, error = %e, "failed to clear cache entry");
                    false
                }
            })
            .count();

        info!(removed, "cache cleared");
        removed
    }

    /// Removes every entry that has expired, returning how many were removed
    ///
    /// Entries that cannot be parsed have no expiry and are left in place;
    /// `clear_all` removes them.
    pub fn sweep_expired(&self) -> usize {
        let Some(storage) = &self.storage else {
            return 0;
        };

        let now = self.clock.now_millis();
        let mut removed = 0;
        for key in self.namespaced_keys(storage.as_ref()) {
            let expired = storage
                .get_item(&key)
                .and_then(|raw| serde_json::from_str::<EntryHeader>(&raw).ok())
                .is_some_and(|header| header.expires_at <= now);

            if !expired {
                continue;
            }
            match storage.remove_item(&key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key = %key, error = %e, "failed to remove expired entry"),
            }
        }

        info!(removed, "swept expired cache entries");
        removed
    }

    /// Scans the namespace and reports entry counts and total size
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        let Some(storage) = &self.storage else {
            return stats;
        };

        let now = self.clock.now_millis();
        for key in self.namespaced_keys(storage.as_ref()) {
            let Some(raw) = storage.get_item(&key) else {
                continue;
            };
            stats.total_entries += 1;
            stats.total_size_bytes += key.len() + raw.len();

            match serde_json::from_str::<EntryHeader>(&raw) {
                Ok(header) if now < header.expires_at => stats.valid_entries += 1,
                Ok(_) => stats.expired_entries += 1,
                Err(_) => {}
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::storage::MemoryStorage;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    /// Cache on an in-memory medium with a clock at t = 1_000_000ms
    fn create_test_cache() -> (CacheManager, Arc<MemoryStorage>, Arc<ManualClock>) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::at(1_000_000));
        let cache = CacheManager::new(storage.clone()).with_clock(clock.clone());
        (cache, storage, clock)
    }

    #[test]
    fn test_set_then_get_returns_data() {
        let (cache, _storage, _clock) = create_test_cache();
        let data = sample("fresh", 100);

        cache.set("fresh_key", &data);

        assert_eq!(cache.get::<TestData>("fresh_key"), Some(data));
        assert!(cache.is_valid("fresh_key"));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _storage, _clock) = create_test_cache();

        assert!(cache.get::<TestData>("nonexistent_key").is_none());
        assert!(cache.get_stale::<TestData>("nonexistent_key").is_none());
        assert!(!cache.is_valid("nonexistent_key"));
    }

    #[test]
    fn test_entry_layout_in_storage() {
        let (cache, storage, _clock) = create_test_cache();
        cache.set_with_ttl("layout", &sample("x", 1), Duration::from_secs(60));

        let raw = storage.get_item("tickercache_layout").expect("entry stored under prefix");
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["key"], "layout");
        assert_eq!(json["data"]["name"], "x");
        assert_eq!(json["timestamp"], 1_000_000);
        assert_eq!(json["expiresAt"], 1_060_000);
    }

    #[test]
    fn test_expired_entry_only_available_stale() {
        let (cache, _storage, clock) = create_test_cache();
        let data = sample("expired", 0);

        cache.set_with_ttl("expired_key", &data, Duration::from_secs(10));
        clock.advance(Duration::from_secs(10));

        assert!(cache.get::<TestData>("expired_key").is_none());
        assert!(!cache.is_valid("expired_key"));
        assert_eq!(cache.get_stale::<TestData>("expired_key"), Some(data));
    }

    #[test]
    fn test_entry_valid_until_last_millisecond() {
        let (cache, _storage, clock) = create_test_cache();
        cache.set_with_ttl("edge", &sample("edge", 1), Duration::from_millis(500));

        clock.advance(Duration::from_millis(499));
        assert!(cache.is_valid("edge"));

        clock.advance(Duration::from_millis(1));
        assert!(!cache.is_valid("edge"));
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let (cache, _storage, clock) = create_test_cache();

        cache.set_with_ttl("overwrite_key", &sample("first", 1), Duration::from_secs(1));
        clock.advance(Duration::from_secs(5));
        cache.set("overwrite_key", &sample("second", 2));

        assert_eq!(cache.get::<TestData>("overwrite_key"), Some(sample("second", 2)));
    }

    #[test]
    fn test_zero_ttl_is_not_written() {
        let (cache, storage, _clock) = create_test_cache();
        cache.set_with_ttl("zero", &sample("zero", 0), Duration::ZERO);

        assert!(storage.keys().is_empty());
    }

    #[test]
    fn test_parse_failure_is_a_miss() {
        let (cache, storage, _clock) = create_test_cache();
        storage.set_item("tickercache_broken", "{oops").unwrap();

        assert!(cache.get::<TestData>("broken").is_none());
        assert!(cache.get_stale::<TestData>("broken").is_none());
        assert!(!cache.is_valid("broken"));
    }

    #[test]
    fn test_wrong_shape_is_a_miss() {
        let (cache, _storage, _clock) = create_test_cache();
        cache.set("shape", &vec![1, 2, 3]);

        assert!(cache.get::<TestData>("shape").is_none());
        assert_eq!(cache.get::<Vec<i32>>("shape"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_invalidate_removes_entry_and_is_idempotent() {
        let (cache, _storage, _clock) = create_test_cache();
        cache.set("gone", &sample("gone", 1));

        cache.invalidate("gone");
        assert!(cache.get::<TestData>("gone").is_none());
        assert!(cache.get_stale::<TestData>("gone").is_none());

        cache.invalidate("gone");
    }

    #[test]
    fn test_clear_all_leaves_foreign_keys() {
        let (cache, storage, _clock) = create_test_cache();
        storage.set_item("favorites", "[\"bitcoin\"]").unwrap();
        cache.set("a", &sample("a", 1));
        cache.set("b", &sample("b", 2));

        assert_eq!(cache.clear_all(), 2);

        assert!(cache.get_stale::<TestData>("a").is_none());
        assert!(cache.get_stale::<TestData>("b").is_none());
        assert_eq!(storage.get_item("favorites").as_deref(), Some("[\"bitcoin\"]"));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (cache, storage, clock) = create_test_cache();
        storage.set_item("unrelated", "keep me").unwrap();
        cache.set_with_ttl("short", &sample("short", 1), Duration::from_secs(1));
        cache.set_with_ttl("long", &sample("long", 2), Duration::from_secs(3600));
        clock.advance(Duration::from_secs(1));

        assert_eq!(cache.sweep_expired(), 1);

        assert!(cache.get_stale::<TestData>("short").is_none());
        assert_eq!(cache.get::<TestData>("long"), Some(sample("long", 2)));
        assert!(storage.get_item("unrelated").is_some());
    }

    #[test]
    fn test_sweep_leaves_unreadable_entries() {
        let (cache, storage, clock) = create_test_cache();
        storage.set_item("tickercache_junk", "not json").unwrap();
        cache.set_with_ttl("short", &sample("short", 1), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(storage.get_item("tickercache_junk").as_deref(), Some("not json"));

        assert_eq!(cache.clear_all(), 1);
        assert!(storage.get_item("tickercache_junk").is_none());
    }

    #[test]
    fn test_stats_counts_valid_expired_and_size() {
        let (cache, storage, clock) = create_test_cache();
        storage.set_item("unrelated", "x").unwrap();
        cache.set_with_ttl("old", &sample("old", 1), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        cache.set("new", &sample("new", 2));
        storage.set_item("tickercache_junk", "???").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.unreadable_entries(), 1);

        let expected_size: usize = ["tickercache_old", "tickercache_new", "tickercache_junk"]
            .iter()
            .map(|k| k.len() + storage.get_item(k).unwrap().len())
            .sum();
        assert_eq!(stats.total_size_bytes, expected_size);
    }

    #[test]
    fn test_quota_failure_sweeps_and_stays_silent() {
        let storage = Arc::new(MemoryStorage::with_capacity(400));
        let clock = Arc::new(ManualClock::at(0));
        let cache = CacheManager::new(storage.clone()).with_clock(clock.clone());

        cache.set_with_ttl("old", &sample("old", 1), Duration::from_secs(1));
        cache.set_with_ttl("keep", &sample("keep", 2), Duration::from_secs(3600));
        clock.advance(Duration::from_secs(2));

        let big = sample(&"x".repeat(400), 3);
        cache.set("big", &big);

        // The oversized write is dropped, the expired entry is swept as recovery
        assert!(cache.get_stale::<TestData>("big").is_none());
        assert!(cache.get_stale::<TestData>("old").is_none());
        assert_eq!(cache.get::<TestData>("keep"), Some(sample("keep", 2)));
    }

    #[test]
    fn test_unavailable_cache_degrades_to_no_cache() {
        let cache = CacheManager::unavailable();
        cache.set("k", &sample("k", 1));

        assert!(!cache.is_available());
        assert!(cache.get::<TestData>("k").is_none());
        assert!(cache.get_stale::<TestData>("k").is_none());
        assert!(!cache.is_valid("k"));
        cache.invalidate("k");
        assert_eq!(cache.clear_all(), 0);
        assert_eq!(cache.sweep_expired(), 0);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_custom_prefix_isolates_namespaces() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let first = CacheManager::new(storage.clone()).with_prefix("one_");
        let second = CacheManager::new(storage.clone()).with_prefix("two_");

        first.set("k", &sample("first", 1));
        second.set("k", &sample("second", 2));
        assert_eq!(first.clear_all(), 1);

        assert!(first.get::<TestData>("k").is_none());
        assert_eq!(second.get::<TestData>("k"), Some(sample("second", 2)));
    }

    #[test]
    fn test_clones_share_storage() {
        let (cache, _storage, _clock) = create_test_cache();
        let clone = cache.clone();

        clone.set("shared", &sample("shared", 7));
        assert_eq!(cache.get::<TestData>("shared"), Some(sample("shared", 7)));
    }

    #[test]
    fn test_default_ttl_applies() {
        let (cache, _storage, clock) = create_test_cache();
        let cache = cache.with_default_ttl(Duration::from_secs(30));
        cache.set("ttl", &sample("ttl", 1));

        clock.advance(Duration::from_secs(29));
        assert!(cache.is_valid("ttl"));
        clock.advance(Duration::from_secs(1));
        assert!(!cache.is_valid("ttl"));
    }

    /// Medium whose writes always fail with an I/O error
    #[derive(Debug)]
    struct FailingStorage;

    impl Storage for FailingStorage {
        fn get_item(&self, _key: &str) -> Option<String> {
            None
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk unavailable")))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }

        fn keys(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn test_write_io_failure_is_silent_miss() {
        let cache = CacheManager::new(Arc::new(FailingStorage));

        cache.set("broken", &sample("broken", 1));

        assert!(cache.is_available());
        assert!(cache.get::<TestData>("broken").is_none());
        assert!(cache.get_stale::<TestData>("broken").is_none());
        assert!(!cache.is_valid("broken"));
        assert_eq!(cache.stats().total_entries, 0);
    }
}
