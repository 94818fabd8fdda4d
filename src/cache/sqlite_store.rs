//! SQLite cache store on the pooled `Database`.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::warn;

use super::{CacheEntry, CacheStore};
use crate::storage::{Database, SharedDatabase};
use crate::types::{ComplexityTier, Result, ResultExt};

const UPSERT: &str = "INSERT INTO response_cache (query, response, model, tier, created_at, response_length)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(query) DO UPDATE SET
        response = excluded.response,
        model = excluded.model,
        tier = excluded.tier,
        created_at = excluded.created_at,
        response_length = excluded.response_length";

pub struct SqliteStore {
    db: SharedDatabase,
}

impl SqliteStore {
    /// Open (creating parent directories) and initialize the database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(path)?;
        db.initialize()?;
        Ok(Self::new(SharedDatabase::new(db)))
    }

    /// Wrap an already-initialized database
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }
}

fn row_to_entry(
    query: String,
    response: String,
    model: String,
    tier: String,
    created_at: String,
) -> Option<CacheEntry> {
    let tier: ComplexityTier = match tier.parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(query = %query, tier = %tier, "Skipping cache row with unknown tier");
            return None;
        }
    };
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    Some(CacheEntry::with_timestamp(query, response, model, tier, created_at))
}

impl CacheStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> Result<Vec<CacheEntry>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT query, response, model, tier, created_at
                 FROM response_cache ORDER BY created_at DESC",
            )
            .with_context("Failed to prepare cache query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .with_context("Failed to read cache rows")?;

        let mut entries = Vec::new();
        for row in rows {
            let (query, response, model, tier, created_at) = row?;
            if let Some(entry) = row_to_entry(query, response, model, tier, created_at) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn put(&self, entry: &CacheEntry) -> Result<()> {
        let conn = self.db.connection()?;
        conn.execute(
            UPSERT,
            params![
                entry.query,
                entry.response,
                entry.model,
                entry.tier.as_str(),
                entry.created_at.to_rfc3339(),
                entry.response_length as i64,
            ],
        )
        .with_context("Failed to upsert cache entry")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.db.connection()?;
        conn.execute("DELETE FROM response_cache", [])
            .with_context("Failed to clear cache table")?;
        Ok(())
    }
}
