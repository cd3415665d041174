//! SQLite-backed partition store and sync queue.
//!
//! This module provides a persistent cache using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Named partitions of response snapshots keyed by request identity
//! - Transactional seeding and whole-partition deletion
//! - A durable search-history queue for background sync
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod migrations;
pub mod partitions;
pub mod sync_queue;

pub use crate::Error;

pub use connection::CacheDb;
pub use partitions::{CacheEntry, Partition, PartitionSummary, ResponseSnapshot};
pub use sync_queue::PendingSyncRecord;
