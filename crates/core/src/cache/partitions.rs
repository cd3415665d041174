//! Named cache partitions of response snapshots.
//!
//! A partition maps a request identity (`"GET /api/events"`) to the most
//! recent response stored for it. Writes overwrite; there is no size or age
//! eviction, only whole-partition deletion when a version is retired.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored (or synthesised) HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// URL the response was fetched from.
    pub url: String,
    pub status: u16,
    /// Header pairs in received order; names compare case-insensitively.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: Vec::new() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A snapshot together with its storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub partition: String,
    pub identity: String,
    pub stored_at: String,
    pub response: ResponseSnapshot,
}

/// Partition name with its entry count, for inspection.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: u64,
    pub seeded_at: Option<String>,
}

/// Handle to one named partition.
///
/// Obtained from [`CacheDb::open_partition`]; cheap to clone.
#[derive(Clone, Debug)]
pub struct Partition {
    db: CacheDb,
    name: String,
}

/// Row values prepared outside the connection thread.
struct EntryRow {
    identity: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn from_snapshot(identity: &str, snapshot: &ResponseSnapshot) -> Result<Self, Error> {
        Ok(Self {
            identity: identity.to_string(),
            url: snapshot.url.clone(),
            status: i64::from(snapshot.status),
            headers_json: serde_json::to_string(&snapshot.headers)?,
            body: snapshot.body.clone(),
        })
    }

    fn upsert(&self, conn: &rusqlite::Connection, partition: &str, stored_at: &str) -> Result<(), Error> {
        conn.execute(
            "INSERT INTO entries (partition, identity, url, status, headers_json, body, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(partition, identity) DO UPDATE SET
                url = excluded.url,
                status = excluded.status,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![partition, &self.identity, &self.url, self.status, &self.headers_json, &self.body, stored_at],
        )?;
        Ok(())
    }
}

fn snapshot_from_row(url: String, status: i64, headers_json: String, body: Vec<u8>) -> Result<ResponseSnapshot, Error> {
    let status = u16::try_from(status).map_err(|_| Error::Serialization(format!("stored status {status} out of range")))?;
    let headers = serde_json::from_str(&headers_json)?;
    Ok(ResponseSnapshot { url, status, headers, body })
}

fn ensure_partition(conn: &rusqlite::Connection, name: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

impl CacheDb {
    /// Open a partition by name, creating it if needed.
    pub async fn open_partition(&self, name: &str) -> Result<Partition, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("partition name cannot be empty".into()));
        }

        let owned = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_partition(conn, &owned) })
            .await
            .map_err(Error::from)?;

        Ok(Partition { db: self.clone(), name: name.to_string() })
    }

    /// Names of all existing partitions, sorted.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// All partitions with their entry counts.
    pub async fn partition_summaries(&self) -> Result<Vec<PartitionSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.identity), p.seeded_at
                     FROM partitions p LEFT JOIN entries e ON e.partition = p.name
                     GROUP BY p.name ORDER BY p.name",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(PartitionSummary {
                            name: row.get(0)?,
                            entries: row.get::<_, i64>(1)? as u64,
                            seeded_at: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }

    /// Seed several partitions in one transaction, marking each seeded.
    ///
    /// Either every batch is written or none is.
    pub async fn seed_partitions(&self, batches: &[(&str, &[(String, ResponseSnapshot)])]) -> Result<(), Error> {
        let batches = batches
            .iter()
            .map(|(partition, entries)| {
                if partition.trim().is_empty() {
                    return Err(Error::InvalidInput("partition name cannot be empty".into()));
                }
                let rows = entries
                    .iter()
                    .map(|(identity, snapshot)| EntryRow::from_snapshot(identity, snapshot))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((partition.to_string(), rows))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                for (partition, rows) in &batches {
                    ensure_partition(&tx, partition)?;
                    for row in rows {
                        row.upsert(&tx, partition, &now)?;
                    }
                    tx.execute("UPDATE partitions SET seeded_at = ?1 WHERE name = ?2", params![now, partition])?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition whose name is not in `keep`.
    ///
    /// Returns the deleted names. Entries go with their partition.
    pub async fn delete_partitions_not_in(&self, keep: &[String]) -> Result<Vec<String>, Error> {
        let keep = keep.to_vec();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT name FROM partitions ORDER BY name")?;
                    let names = stmt
                        .query_map([], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?;
                    names.into_iter().filter(|name| !keep.contains(name)).collect()
                };
                for name in &stale {
                    tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                }
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for a request identity.
    pub async fn get(&self, identity: &str) -> Result<Option<ResponseSnapshot>, Error> {
        Ok(self.entry(identity).await?.map(|entry| entry.response))
    }

    /// Look up the stored response along with when it was stored.
    pub async fn entry(&self, identity: &str) -> Result<Option<CacheEntry>, Error> {
        let partition = self.name.clone();
        let identity = identity.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, headers_json, body, stored_at
                     FROM entries WHERE partition = ?1 AND identity = ?2",
                )?;

                let result = stmt.query_row(params![partition, identity], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                });

                match result {
                    Ok((url, status, headers_json, body, stored_at)) => Ok(Some(CacheEntry {
                        response: snapshot_from_row(url, status, headers_json, body)?,
                        partition,
                        identity,
                        stored_at,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under a request identity, replacing any previous one.
    pub async fn put(&self, identity: &str, snapshot: &ResponseSnapshot) -> Result<(), Error> {
        let row = EntryRow::from_snapshot(identity, snapshot)?;
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                ensure_partition(conn, &partition)?;
                row.upsert(conn, &partition, &chrono::Utc::now().to_rfc3339())
            })
            .await
            .map_err(Error::from)
    }

    /// Whether [`CacheDb::seed_partitions`] has completed for this partition.
    pub async fn is_seeded(&self) -> Result<bool, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let seeded = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1 AND seeded_at IS NOT NULL)",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(seeded)
            })
            .await
            .map_err(Error::from)
    }

    /// Request identities stored in this partition, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT identity FROM entries WHERE partition = ?1 ORDER BY identity")?;
                let keys = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn len(&self) -> Result<u64, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
