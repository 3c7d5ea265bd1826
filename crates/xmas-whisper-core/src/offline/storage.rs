//! Named response caches: in-memory and SQLite-backed.

use parking_lot::Mutex;
use rusqlite::{params, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{CacheStorage, Response};
use crate::error::StorageError;
use crate::storage::Database;

#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: Mutex<BTreeMap<String, HashMap<String, Response>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.caches.lock().keys().cloned().collect())
    }

    fn put(&self, cache_name: &str, url: &str, response: &Response) -> Result<(), StorageError> {
        self.caches
            .lock()
            .entry(cache_name.to_string())
            .or_default()
            .insert(url.to_string(), response.clone());
        Ok(())
    }

    fn match_in(&self, cache_name: &str, url: &str) -> Result<Option<Response>, StorageError> {
        Ok(self
            .caches
            .lock()
            .get(cache_name)
            .and_then(|entries| entries.get(url))
            .cloned())
    }

    fn delete(&self, cache_name: &str) -> Result<bool, StorageError> {
        Ok(self.caches.lock().remove(cache_name).is_some())
    }
}

/// Caches persisted in the `offline_cache` table.
pub struct SqliteCacheStorage {
    db: Arc<Database>,
}

impl SqliteCacheStorage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl CacheStorage for SqliteCacheStorage {
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT cache_name FROM offline_cache ORDER BY cache_name")?;
            let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
            names.collect()
        })
    }

    fn put(&self, cache_name: &str, url: &str, response: &Response) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO offline_cache (cache_name, url, status, content_type, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    cache_name,
                    url,
                    response.status,
                    response.content_type,
                    response.body
                ],
            )?;
            Ok(())
        })
    }

    fn match_in(&self, cache_name: &str, url: &str) -> Result<Option<Response>, StorageError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT status, content_type, body FROM offline_cache
                 WHERE cache_name = ?1 AND url = ?2",
                params![cache_name, url],
                |row| {
                    Ok(Response {
                        status: row.get(0)?,
                        content_type: row.get(1)?,
                        body: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    fn delete(&self, cache_name: &str) -> Result<bool, StorageError> {
        self.db.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM offline_cache WHERE cache_name = ?1",
                params![cache_name],
            )?;
            Ok(removed > 0)
        })
    }
}
