//! JSON file cache store.
//!
//! The whole cache is one JSON object keyed by query. Every write rewrites
//! the file through a temp file and rename, so a crash leaves either the old
//! or the new file, never a torn one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CacheEntry, CacheStore};
use crate::types::{ComplexityTier, Result, ResultExt, TierError};

/// On-disk value for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredResponse {
    response: String,
    model: String,
    tier: ComplexityTier,
    created_at: DateTime<Utc>,
    #[serde(default)]
    response_length: usize,
}

impl StoredResponse {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            response: entry.response.clone(),
            model: entry.model.clone(),
            tier: entry.tier,
            created_at: entry.created_at,
            response_length: entry.response_length,
        }
    }

    fn into_entry(self, query: String) -> CacheEntry {
        CacheEntry::with_timestamp(query, self.response, self.model, self.tier, self.created_at)
    }
}

type Document = BTreeMap<String, StoredResponse>;

pub struct JsonFileStore {
    path: PathBuf,
    /// Mirror of the file; `None` until first read
    document: Mutex<Option<Document>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file is an empty cache; an unparseable one is discarded
    fn read_document(&self) -> Result<Document> {
        if !self.path.exists() {
            return Ok(Document::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Document::new());
        }

        match serde_json::from_str(&content) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    "Cache file is corrupt, starting fresh: {}", e
                );
                Ok(Document::new())
            }
        }
    }

    fn write_document(&self, document: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .with_context_fn(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context_fn(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Document>>> {
        self.document
            .lock()
            .map_err(|_| TierError::Storage("JSON cache lock poisoned".to_string()))
    }
}

impl CacheStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    fn load(&self) -> Result<Vec<CacheEntry>> {
        let mut guard = self.lock()?;
        let document = self.read_document()?;
        let entries = document
            .iter()
            .map(|(query, stored)| stored.clone().into_entry(query.clone()))
            .collect();
        *guard = Some(document);
        Ok(entries)
    }

    fn put(&self, entry: &CacheEntry) -> Result<()> {
        let mut guard = self.lock()?;
        let mut document = match guard.take() {
            Some(doc) => doc,
            None => self.read_document()?,
        };

        document.insert(entry.query.clone(), StoredResponse::from_entry(entry));
        let written = self.write_document(&document);
        *guard = Some(document);
        written?;

        debug!(path = %self.path.display(), "Persisted cache entry");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.lock()?;
        let document = Document::new();
        self.write_document(&document)?;
        *guard = Some(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(query: &str, response: &str) -> CacheEntry {
        CacheEntry::new(query, response, "mistral", ComplexityTier::Medium)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_put_then_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/cache.json");

        let store = JsonFileStore::new(&path);
        store.put(&entry("q1", "a1")).unwrap();
        store.put(&entry("q2", "a2")).unwrap();
        store.put(&entry("q1", "a1 revised")).unwrap();

        let reopened = JsonFileStore::new(&path);
        let mut loaded = reopened.load().unwrap();
        loaded.sort_by(|a, b| a.query.cmp(&b.query));

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].response, "a1 revised");
        assert_eq!(loaded[0].response_length, 10);
        assert_eq!(loaded[1].tier, ComplexityTier::Medium);
    }

    #[test]
    fn test_file_is_object_keyed_by_query() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        JsonFileStore::new(&path)
            .put(&entry("what is rust?", "A language."))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["what is rust?"]["response"], "A language.");
        assert_eq!(raw["what is rust?"]["tier"], "medium");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_put_preserves_entries_written_earlier() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        JsonFileStore::new(&path).put(&entry("old", "kept")).unwrap();

        // Fresh handle writes without calling load first
        JsonFileStore::new(&path).put(&entry("new", "added")).unwrap();

        let loaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_corrupt_file_is_replaced() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_empty());
        store.put(&entry("q", "a")).unwrap();
        assert_eq!(JsonFileStore::new(&path).load().unwrap().len(), 1);
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        let store = JsonFileStore::new(&path);
        store.put(&entry("q", "a")).unwrap();
        store.clear().unwrap();
        assert!(JsonFileStore::new(&path).load().unwrap().is_empty());
    }
}
