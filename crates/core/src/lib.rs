//! Core types and shared functionality for tether.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Durable search-history sync queue
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, Partition, PartitionSummary, PendingSyncRecord, ResponseSnapshot};
pub use config::{AppConfig, ConfigError, PartitionKind, PartitionSet, PartitionSpec};
pub use error::Error;
