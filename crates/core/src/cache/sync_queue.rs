//! Durable queue of search-history records awaiting background sync.
//!
//! Records are appended while offline-capable and flipped to `synced` once
//! the server has accepted them. They are never deleted.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// One unsynchronised (or already synchronised) search-history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PendingSyncRecord {
    pub id: i64,
    pub query: String,
    pub searched_at: String,
    pub synced: bool,
}

impl CacheDb {
    /// Append a search to the queue as unsynced.
    pub async fn enqueue_search(&self, query: &str) -> Result<PendingSyncRecord, Error> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("search query cannot be empty".into()));
        }

        let query = query.to_string();
        let searched_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<PendingSyncRecord, Error> {
                conn.execute(
                    "INSERT INTO search_history (query, searched_at, synced) VALUES (?1, ?2, 0)",
                    params![query, searched_at],
                )?;
                Ok(PendingSyncRecord { id: conn.last_insert_rowid(), query, searched_at, synced: false })
            })
            .await
            .map_err(Error::from)
    }

    /// Every record in the queue, oldest first.
    pub async fn all_searches(&self) -> Result<Vec<PendingSyncRecord>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PendingSyncRecord>, Error> {
                let mut stmt = conn.prepare("SELECT id, query, searched_at, synced FROM search_history ORDER BY id")?;
                let records = stmt
                    .query_map([], |row| {
                        Ok(PendingSyncRecord {
                            id: row.get(0)?,
                            query: row.get(1)?,
                            searched_at: row.get(2)?,
                            synced: row.get::<_, i32>(3)? == 1,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(Error::from)
    }

    /// Write a record back in place (keyed by id).
    pub async fn put_search(&self, record: &PendingSyncRecord) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let updated = conn.execute(
                    "UPDATE search_history SET query = ?1, searched_at = ?2, synced = ?3 WHERE id = ?4",
                    params![record.query, record.searched_at, record.synced as i32, record.id],
                )?;
                if updated == 0 {
                    return Err(Error::InvalidInput(format!("no search-history record with id {}", record.id)));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Flip `synced` on each listed record. Returns the number updated.
    pub async fn mark_searches_synced(&self, ids: &[i64]) -> Result<u64, Error> {
        let ids = ids.to_vec();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let mut updated = 0u64;
                for id in &ids {
                    updated += tx.execute("UPDATE search_history SET synced = 1 WHERE id = ?1", params![id])? as u64;
                }
                tx.commit()?;
                Ok(updated)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_assigns_increasing_ids() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.enqueue_search("tシャツ").await.unwrap();
        let second = db.enqueue_search("デザイン会社").await.unwrap();

        assert!(second.id > first.id);
        assert!(!first.synced);

        let all = db.all_searches().await.unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn test_enqueue_empty_query() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(matches!(db.enqueue_search("  ").await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_put_search_updates_in_place() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut record = db.enqueue_search("events").await.unwrap();
        record.synced = true;
        db.put_search(&record).await.unwrap();

        let all = db.all_searches().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].synced);
    }

    #[tokio::test]
    async fn test_put_search_unknown_id() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let record = PendingSyncRecord { id: 42, query: "x".into(), searched_at: "now".into(), synced: true };
        assert!(db.put_search(&record).await.is_err());
    }

    #[tokio::test]
    async fn test_mark_searches_synced() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = db.enqueue_search("jobs").await.unwrap();
        let b = db.enqueue_search("brands").await.unwrap();
        db.enqueue_search("posts").await.unwrap();

        let updated = db.mark_searches_synced(&[a.id, b.id]).await.unwrap();
        assert_eq!(updated, 2);

        let synced: Vec<bool> = db.all_searches().await.unwrap().iter().map(|r| r.synced).collect();
        assert_eq!(synced, vec![true, true, false]);
    }
}
