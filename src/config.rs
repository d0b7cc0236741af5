//! Configuration loaded from environment variables

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, DEFAULT_BASE_URL};
use crate::cache::{CacheManager, FileStorage, DEFAULT_CAPACITY_BYTES, DEFAULT_PREFIX, DEFAULT_TTL};

/// Runtime settings for the cache and the API client
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// API root, without trailing slash
    pub base_url: String,
    /// Namespace prefix for cache keys in the storage medium
    pub cache_prefix: String,
    /// How long fetched data stays fresh
    pub default_ttl: Duration,
    /// Storage directory; `None` means the XDG cache directory
    pub cache_dir: Option<PathBuf>,
    /// Storage capacity in bytes
    pub storage_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_prefix: DEFAULT_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL,
            cache_dir: None,
            storage_capacity: DEFAULT_CAPACITY_BYTES,
        }
    }
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TICKERCACHE_BASE_URL` - API root (default: `https://api.coingecko.com/api/v3`)
    /// - `TICKERCACHE_PREFIX` - Cache key prefix (default: `tickercache_`)
    /// - `TICKERCACHE_TTL_SECS` - Freshness window in seconds (default: 300)
    /// - `TICKERCACHE_DIR` - Storage directory (default: XDG cache directory)
    /// - `TICKERCACHE_CAPACITY_BYTES` - Storage capacity (default: 5 MiB)
    ///
    /// Unparseable numbers fall back to their defaults, as does a zero TTL.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("TICKERCACHE_BASE_URL").unwrap_or(defaults.base_url),
            cache_prefix: env::var("TICKERCACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            default_ttl: env::var("TICKERCACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            cache_dir: env::var_os("TICKERCACHE_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            storage_capacity: env::var("TICKERCACHE_CAPACITY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.storage_capacity),
        }
    }

    /// Opens the configured storage and wraps it in a cache manager
    ///
    /// Without an explicit directory this uses the XDG cache directory, and
    /// falls back to a disabled cache when there is none.
    pub fn cache_manager(&self) -> CacheManager {
        let storage = match &self.cache_dir {
            Some(dir) => Some(FileStorage::open(dir, self.storage_capacity)),
            None => FileStorage::open_default(self.storage_capacity),
        };

        let cache = match storage {
            Some(storage) => CacheManager::new(Arc::new(storage)),
            None => {
                tracing::warn!("no cache directory available, caching disabled");
                CacheManager::unavailable()
            }
        };

        cache
            .with_prefix(self.cache_prefix.clone())
            .with_default_ttl(self.default_ttl)
    }

    /// Builds an API client over [`Config::cache_manager`]
    pub fn api_client(&self) -> ApiClient {
        ApiClient::new(self.cache_manager()).with_base_url(self.base_url.clone())
    }
}
