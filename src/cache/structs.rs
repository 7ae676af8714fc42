use anyhow::{Context, Result};
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// In-process TTL cache for computed analyses
///
/// Entries expire lazily: an expired entry is dropped when it is read.
/// Writers overwrite unconditionally.
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            default_ttl,
        }
    }

    /// Load a live entry; `None` on miss, expiry or shape mismatch
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.expires_at <= now,
        };

        if expired {
            entries.remove(key);
            debug!("Cache entry expired: {}", key);
            return None;
        }

        entries
            .get(key)
            .and_then(|entry| serde_json::from_value(entry.value.clone()).ok())
    }

    /// Store with the default TTL
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize cache value for key: {}", key))?;
        let expires_at = self.clock.now() + ttl;

        self.entries
            .lock()
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("Cleared result cache");
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stable key from an operation name and its arguments: `op:arg1:arg2`
pub fn cache_key(operation: &str, args: &[&dyn Display]) -> String {
    let mut key = operation.to_string();
    for arg in args {
        key.push(':');
        key.push_str(&arg.to_string());
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        value: String,
    }

    fn cache_with_clock() -> (ResultCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResultCache::with_clock(Duration::from_secs(300), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_cache_set_and_get() {
        let (cache, _) = cache_with_clock();
        let data = TestData {
            value: "test".to_string(),
        };

        cache.set("test_key", &data).unwrap();
        let loaded: Option<TestData> = cache.get("test_key");

        assert_eq!(loaded, Some(data));
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set("k", &1u32).unwrap();

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get::<u32>("k"), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get::<u32>("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_per_entry_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set_with_ttl("heavy", &"matrix", Duration::from_secs(600)).unwrap();
        cache.set("light", &"ranks").unwrap();

        clock.advance(Duration::from_secs(400));

        assert_eq!(cache.get::<String>("heavy").as_deref(), Some("matrix"));
        assert_eq!(cache.get::<String>("light"), None);
    }

    #[test]
    fn test_last_write_wins_and_clear() {
        let (cache, _) = cache_with_clock();
        cache.set("k", &1u32).unwrap();
        cache.set("k", &2u32).unwrap();
        assert_eq!(cache.get::<u32>("k"), Some(2));

        cache.clear();
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("divergence", &[&3, &"all"]), "divergence:3:all");
        assert_eq!(cache_key("spice", &[]), "spice");
    }
}
