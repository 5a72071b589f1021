use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::path::PathBuf;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use crate::error::AppError;

pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dota_counters")
}

struct MemoEntry<V> {
    stored_at: DateTime<Utc>,
    value: V,
}

/// In-process read-through memo.
///
/// Entries older than the TTL are refetched on next access; `invalidate` drops
/// one manually. A `None` TTL keeps entries for the process lifetime.
pub struct MemoCache<K, V> {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<K, MemoEntry<V>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Option<Duration>) -> Self {
        MemoCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A TTL chrono cannot represent means entries never expire.
    pub fn with_ttl_mins(mins: u64) -> Self {
        let ttl = i64::try_from(mins).ok().and_then(Duration::try_minutes);
        if ttl.is_none() {
            tracing::warn!(mins, "cache TTL out of range; entries will not expire");
        }
        Self::new(ttl)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| !self.is_expired(entry.stored_at))
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().insert(
            key,
            MemoEntry {
                stored_at: Utc::now(),
                value,
            },
        );
    }

    /// Returns the cached value or runs `fetch`, storing only successes.
    ///
    /// The lock is not held while `fetch` runs, so concurrent misses on the
    /// same key may fetch twice; the last writer wins.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    #[allow(dead_code)]
    pub fn invalidate(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn is_expired(&self, stored_at: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now().signed_duration_since(stored_at) > ttl,
            None => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry<T> {
    stored_at: DateTime<Utc>,
    value: T,
}

/// JSON blobs persisted between runs, one file per key.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskCache { dir: dir.into() }
    }

    pub fn in_default_dir() -> Self {
        Self::new(cache_dir())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Loads `key` unless it is missing, unreadable, or older than `max_age_mins`.
    pub fn load<T: DeserializeOwned>(&self, key: &str, max_age_mins: u64) -> Option<T> {
        let content = fs::read_to_string(self.path_for(key)).ok()?;
        let entry: DiskEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring corrupt cache entry");
                return None;
            }
        };
        let age = Utc::now().signed_duration_since(entry.stored_at);
        if age.num_minutes() > max_age_mins as i64 {
            tracing::debug!(key, age_mins = age.num_minutes(), "cache entry is stale");
            return None;
        }
        Some(entry.value)
    }

    pub fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;
        let entry = DiskEntry {
            stored_at: Utc::now(),
            value,
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| AppError::JsonError(format!("Failed to serialize cache: {}", e)))?;
        fs::write(self.path_for(key), json)?;
        Ok(())
    }
}
