//! Storage media the cache manager can sit on
//!
//! A storage medium is a synchronous, string-keyed, string-valued map with a
//! finite capacity. Two media are provided:
//!
//! - [`FileStorage`]: a single JSON map file in the XDG cache directory
//!   (`~/.cache/tickercache/` on Linux), persisted across runs.
//! - [`MemoryStorage`]: a process-local map, mostly for tests.
//!
//! Both refuse a write that would take them over capacity with
//! [`StorageError::QuotaExceeded`] and leave their contents unchanged.

use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::warn;

/// Default capacity of a storage medium (5 MiB)
pub const DEFAULT_CAPACITY_BYTES: usize = 5 * 1024 * 1024;

/// Name of the map file inside a `FileStorage` directory
const STORAGE_FILE_NAME: &str = "storage.json";

/// Errors a storage medium can report
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the medium's capacity
    #[error("Storage quota exceeded: need {needed} bytes, capacity is {capacity} bytes")]
    QuotaExceeded { needed: usize, capacity: usize },

    /// Reading or writing the backing file failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing map could not be serialized
    #[error("Storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A synchronous string key-value medium
pub trait Storage: Send + Sync + Debug {
    /// Returns the value stored under `key`, if any
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently stored, in no particular order
    fn keys(&self) -> Vec<String>;
}

/// Map plus a running byte count of keys and values
#[derive(Debug, Default)]
struct Items {
    map: BTreeMap<String, String>,
    used: usize,
}

impl Items {
    fn from_map(map: BTreeMap<String, String>) -> Self {
        let used = map.iter().map(|(k, v)| k.len() + v.len()).sum();
        Self { map, used }
    }

    /// Inserts if the result fits in `capacity`, returning the replaced value
    fn insert_within(
        &mut self,
        key: &str,
        value: &str,
        capacity: usize,
    ) -> Result<Option<String>, StorageError> {
        let freed = self.map.get(key).map_or(0, |old| key.len() + old.len());
        let needed = self.used - freed + key.len() + value.len();
        if needed > capacity {
            return Err(StorageError::QuotaExceeded { needed, capacity });
        }

        self.used = needed;
        Ok(self.map.insert(key.to_string(), value.to_string()))
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.map.remove(key)?;
        self.used -= key.len() + removed.len();
        Some(removed)
    }

    /// Puts back whatever `key` held before a failed mutation
    fn restore(&mut self, key: &str, previous: Option<String>) {
        self.remove(key);
        if let Some(value) = previous {
            self.used += key.len() + value.len();
            self.map.insert(key.to_string(), value);
        }
    }
}

fn lock(items: &Mutex<Items>) -> MutexGuard<'_, Items> {
    // A panic while holding the lock cannot leave the map half-written
    items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-local storage medium
#[derive(Debug)]
pub struct MemoryStorage {
    items: Mutex<Items>,
    capacity: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty medium with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_BYTES)
    }

    /// Creates an empty medium holding at most `capacity` bytes of keys and values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Items::default()),
            capacity,
        }
    }

    /// Bytes currently used by keys and values
    pub fn used_bytes(&self) -> usize {
        lock(&self.items).used
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).map.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.items).insert_within(key, value, self.capacity)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.items).remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.items).map.keys().cloned().collect()
    }
}

/// Storage medium persisted as one JSON map file
///
/// The whole map is loaded when the storage is opened and rewritten on every
/// mutation (temp file + rename), so readers never see a half-written file.
#[derive(Debug)]
pub struct FileStorage {
    /// Directory holding the map file
    dir: PathBuf,
    items: Mutex<Items>,
    capacity: usize,
}

impl FileStorage {
    /// Opens the storage in the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/tickercache/` on Linux, or the platform equivalent.
    /// Returns `None` if the cache directory cannot be determined (e.g., no
    /// home directory), which callers treat as "no storage available".
    pub fn open_default(capacity: usize) -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "tickercache")?;
        Some(Self::open(project_dirs.cache_dir(), capacity))
    }

    /// Opens the storage in `dir`
    ///
    /// The directory is created on the first write. A missing map file opens
    /// empty; a corrupt one is logged and also opens empty.
    pub fn open(dir: impl AsRef<Path>, capacity: usize) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let map = load_map(&dir.join(STORAGE_FILE_NAME));
        Self {
            dir,
            items: Mutex::new(Items::from_map(map)),
            capacity,
        }
    }

    /// Directory the map file lives in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE_NAME)
    }

    /// Writes the map to disk atomically
    fn persist(&self, items: &Items) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(&items.map)?;
        let tmp = self.dir.join(format!("{}.tmp", STORAGE_FILE_NAME));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.file_path())?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).map.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        let previous = items.insert_within(key, value, self.capacity)?;
        if let Err(e) = self.persist(&items) {
            items.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&items) {
            items.restore(key, Some(previous));
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.items).map.keys().cloned().collect()
    }
}

/// Reads a map file, treating a missing or unreadable file as empty
fn load_map(path: &Path) -> BTreeMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "storage file unreadable, starting empty");
            return BTreeMap::new();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "storage file corrupt, starting empty");
        BTreeMap::new()
    })
}
