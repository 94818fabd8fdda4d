//! Response Cache
//!
//! Query-keyed store of previous responses. The in-memory map is the source
//! of truth for lookups; an optional `CacheStore` makes entries survive
//! restarts.
//!
//! ## Backends
//!
//! - **memory**: process lifetime only
//! - **json**: single JSON object keyed by query, rewritten atomically
//! - **sqlite**: `response_cache` table in a pooled SQLite database
//!
//! ## Keys
//!
//! The raw query text, case-sensitive and untrimmed.

mod json_store;
mod sqlite_store;

pub use json_store::JsonFileStore;
pub use sqlite_store::SqliteStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{CacheBackend, CacheConfig};
use crate::types::{ComplexityTier, Result};

/// One cached response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query: String,
    pub response: String,
    pub model: String,
    pub tier: ComplexityTier,
    pub created_at: DateTime<Utc>,
    /// Character count of `response`
    pub response_length: usize,
}

impl CacheEntry {
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        model: impl Into<String>,
        tier: ComplexityTier,
    ) -> Self {
        Self::with_timestamp(query, response, model, tier, Utc::now())
    }

    pub fn with_timestamp(
        query: impl Into<String>,
        response: impl Into<String>,
        model: impl Into<String>,
        tier: ComplexityTier,
        created_at: DateTime<Utc>,
    ) -> Self {
        let response = response.into();
        Self {
            query: query.into(),
            response_length: response.chars().count(),
            response,
            model: model.into(),
            tier,
            created_at,
        }
    }
}

/// Aggregate view over the cache, recomputed on demand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub count: usize,
    pub total_chars: usize,
    pub by_model: BTreeMap<String, usize>,
    pub by_tier: BTreeMap<ComplexityTier, usize>,
}

/// Durable persistence behind the in-memory map
pub trait CacheStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// All persisted entries
    fn load(&self) -> Result<Vec<CacheEntry>>;

    /// Insert or overwrite one entry
    fn put(&self, entry: &CacheEntry) -> Result<()>;

    /// Remove every entry
    fn clear(&self) -> Result<()>;
}

pub type SharedStore = Arc<dyn CacheStore>;

/// Open the store selected by `cache.backend` (`None` for memory)
pub fn open_store(config: &CacheConfig) -> Result<Option<SharedStore>> {
    let path = config.resolved_path();
    let store: Option<SharedStore> = match config.backend {
        CacheBackend::Memory => None,
        CacheBackend::Json => Some(Arc::new(JsonFileStore::new(path))),
        CacheBackend::Sqlite => Some(Arc::new(SqliteStore::open(&path)?)),
    };
    Ok(store)
}

/// Response cache shared by all routed queries
pub struct ResponseCache {
    enabled: bool,
    entries: DashMap<String, CacheEntry>,
    store: Option<SharedStore>,
}

impl ResponseCache {
    /// Memory-only cache
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
            store: None,
        }
    }

    /// Cache backed by a durable store; existing entries are loaded now
    pub fn with_store(enabled: bool, store: SharedStore) -> Self {
        let entries = DashMap::new();
        match store.load() {
            Ok(loaded) => {
                for entry in loaded {
                    entries.insert(entry.query.clone(), entry);
                }
                debug!(store = store.name(), count = entries.len(), "Loaded cache entries");
            }
            Err(e) => {
                warn!(store = store.name(), "Failed to load cache, starting empty: {}", e);
            }
        }
        Self {
            enabled,
            entries,
            store: Some(store),
        }
    }

    /// Build from configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(match open_store(config)? {
            Some(store) => Self::with_store(config.enabled, store),
            None => Self::new(config.enabled),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backend name (`memory` when no store is attached)
    pub fn backend_name(&self) -> &str {
        self.store.as_ref().map_or("memory", |s| s.name())
    }

    pub fn get(&self, query: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        self.entries.get(query).map(|e| e.value().clone())
    }

    /// Insert or overwrite; store failures are logged, never returned
    ///
    /// The key's shard stays write-locked across the store write and the
    /// memory insert, so concurrent writers land in the same order in both.
    pub fn set(&self, query: &str, response: &str, model: &str, tier: ComplexityTier) {
        if !self.enabled {
            return;
        }

        let slot = self.entries.entry(query.to_string());
        let entry = CacheEntry::new(query, response, model, tier);

        if let Some(store) = &self.store
            && let Err(e) = store.put(&entry)
        {
            warn!(store = store.name(), model, "Cache write failed, keeping in memory only: {}", e);
        }

        slot.insert(entry);
    }

    /// Remove all entries from memory and the store
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();

        if let Some(store) = &self.store
            && let Err(e) = store.clear()
        {
            warn!(store = store.name(), "Failed to clear cache store: {}", e);
        }

        info!("Cleared {} cache entries", count);
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            stats.count += 1;
            stats.total_chars += entry.response_length;
            *stats.by_model.entry(entry.model.clone()).or_default() += 1;
            *stats.by_tier.entry(entry.tier).or_default() += 1;
        }
        stats
    }

    /// Snapshot of all entries, newest first
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.query.cmp(&b.query)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TierError;
    use std::collections::HashMap;
    use std::sync::{Mutex, mpsc};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Store that always fails writes
    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        fn load(&self) -> Result<Vec<CacheEntry>> {
            Err(TierError::Storage("unreadable".to_string()))
        }
        fn put(&self, _entry: &CacheEntry) -> Result<()> {
            Err(TierError::Storage("disk full".to_string()))
        }
        fn clear(&self) -> Result<()> {
            Err(TierError::Storage("disk full".to_string()))
        }
    }

    /// Store recording every put
    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<CacheEntry>>,
    }

    impl CacheStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }
        fn load(&self) -> Result<Vec<CacheEntry>> {
            Ok(vec![CacheEntry::new("seed", "seeded", "llama3", ComplexityTier::Advanced)])
        }
        fn put(&self, entry: &CacheEntry) -> Result<()> {
            self.puts.lock().unwrap().push(entry.clone());
            Ok(())
        }
        fn clear(&self) -> Result<()> {
            self.puts.lock().unwrap().clear();
            Ok(())
        }
    }

    #[test]
    fn test_round_trip() {
        let cache = ResponseCache::new(true);
        cache.set("q", "r", "m", ComplexityTier::Medium);

        let entry = cache.get("q").unwrap();
        assert_eq!(entry.response, "r");
        assert_eq!(entry.model, "m");
        assert_eq!(entry.tier, ComplexityTier::Medium);
        assert_eq!(entry.response_length, 1);
    }

    #[test]
    fn test_overwrite_keeps_last() {
        let cache = ResponseCache::new(true);
        cache.set("q", "first", "tinyllama", ComplexityTier::Simple);
        cache.set("q", "second", "mistral", ComplexityTier::Medium);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("q").unwrap().response, "second");
    }

    #[test]
    fn test_key_is_raw_text() {
        let cache = ResponseCache::new(true);
        cache.set("Hello", "r", "m", ComplexityTier::Simple);
        assert!(cache.get("hello").is_none());
        assert!(cache.get("Hello ").is_none());
        assert!(cache.get("Hello").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::new(true);
        cache.set("a", "1", "m", ComplexityTier::Simple);
        cache.set("b", "2", "m", ComplexityTier::Simple);
        cache.clear();
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_is_inert() {
        let cache = ResponseCache::new(false);
        cache.set("q", "r", "m", ComplexityTier::Simple);
        assert!(cache.get("q").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_stats() {
        let cache = ResponseCache::new(true);
        cache.set("a", "four", "tinyllama", ComplexityTier::Simple);
        cache.set("b", "héllo", "mistral", ComplexityTier::Medium);
        cache.set("c", "x", "mistral", ComplexityTier::Simple);

        let stats = cache.stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.total_chars, 10);
        assert_eq!(stats.by_model.get("mistral"), Some(&2));
        assert_eq!(stats.by_tier.get(&ComplexityTier::Simple), Some(&2));
        assert_eq!(stats.by_tier.get(&ComplexityTier::Advanced), None);
    }

    #[test]
    fn test_store_failure_does_not_surface() {
        let cache = ResponseCache::with_store(true, Arc::new(BrokenStore));
        assert!(cache.is_empty());

        cache.set("q", "r", "m", ComplexityTier::Simple);
        assert_eq!(cache.get("q").unwrap().response, "r");

        cache.clear();
        assert!(cache.get("q").is_none());
    }

    #[test]
    fn test_store_receives_writes_and_seeds_memory() {
        let store = Arc::new(RecordingStore::default());
        let cache = ResponseCache::with_store(true, store.clone());

        assert_eq!(cache.get("seed").unwrap().response, "seeded");
        cache.set("q", "r", "m", ComplexityTier::Medium);
        assert_eq!(store.puts.lock().unwrap().len(), 1);
        assert_eq!(cache.backend_name(), "recording");
    }

    #[test]
    fn test_entries_newest_first() {
        let cache = ResponseCache::new(true);
        let older = Utc::now() - chrono::Duration::minutes(5);
        cache.entries.insert(
            "old".to_string(),
            CacheEntry::with_timestamp("old", "r", "m", ComplexityTier::Simple, older),
        );
        cache.set("new", "r", "m", ComplexityTier::Simple);

        let entries = cache.entries();
        assert_eq!(entries[0].query, "new");
        assert_eq!(entries[1].query, "old");
    }

    #[test]
    fn test_from_config_json_survives_restart() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig {
            enabled: true,
            backend: CacheBackend::Json,
            path: Some(temp.path().join("cache.json")),
        };

        let cache = ResponseCache::from_config(&config).unwrap();
        cache.set("what is the capital of France?", "Paris.", "tinyllama", ComplexityTier::Simple);
        drop(cache);

        let reopened = ResponseCache::from_config(&config).unwrap();
        assert_eq!(reopened.backend_name(), "json");
        assert_eq!(
            reopened.get("what is the capital of France?").unwrap().response,
            "Paris."
        );
    }

    #[test]
    fn test_from_config_memory() {
        let config = CacheConfig {
            enabled: true,
            backend: CacheBackend::Memory,
            path: None,
        };
        let cache = ResponseCache::from_config(&config).unwrap();
        assert_eq!(cache.backend_name(), "memory");
    }

    /// Store whose write of response "A" parks until released
    struct GatedStore {
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
        durable: Mutex<HashMap<String, String>>,
    }

    impl CacheStore for GatedStore {
        fn name(&self) -> &str {
            "gated"
        }
        fn load(&self) -> Result<Vec<CacheEntry>> {
            Ok(Vec::new())
        }
        fn put(&self, entry: &CacheEntry) -> Result<()> {
            if entry.response == "A" {
                self.started.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
            }
            self.durable
                .lock()
                .unwrap()
                .insert(entry.query.clone(), entry.response.clone());
            Ok(())
        }
        fn clear(&self) -> Result<()> {
            self.durable.lock().unwrap().clear();
            Ok(())
        }
    }

    #[test]
    fn test_overlapping_sets_agree_in_memory_and_store() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(GatedStore {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
            durable: Mutex::new(HashMap::new()),
        });
        let cache = Arc::new(ResponseCache::with_store(true, store.clone()));

        let first = {
            let cache = cache.clone();
            thread::spawn(move || cache.set("q", "A", "tinyllama", ComplexityTier::Simple))
        };
        started_rx.recv().unwrap();

        let second = {
            let cache = cache.clone();
            thread::spawn(move || cache.set("q", "B", "mistral", ComplexityTier::Medium))
        };
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        first.join().unwrap();
        second.join().unwrap();

        let memory = cache.get("q").unwrap().response;
        let durable = store.durable.lock().unwrap().get("q").cloned().unwrap();
        assert_eq!(memory, durable);
        assert_eq!(memory, "B");
    }

    #[test]
    fn test_concurrent_sets_match_json_file_after_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        let cache = ResponseCache::with_store(true, Arc::new(JsonFileStore::new(&path)));

        thread::scope(|scope| {
            for i in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    for round in 0..5 {
                        let answer = format!("answer {} from writer {}", round, i);
                        cache.set("shared question", &answer, "mistral", ComplexityTier::Medium);
                        cache.set(&format!("own question {}", i), &answer, "tinyllama", ComplexityTier::Simple);
                    }
                });
            }
        });

        let reloaded = ResponseCache::with_store(true, Arc::new(JsonFileStore::new(&path)));
        assert_eq!(reloaded.len(), cache.len());
        assert_eq!(cache.len(), 9);
        for entry in cache.entries() {
            let on_disk = reloaded.get(&entry.query).unwrap();
            assert_eq!(on_disk.response, entry.response, "query {:?}", entry.query);
            assert_eq!(on_disk.model, entry.model);
        }
    }
}
