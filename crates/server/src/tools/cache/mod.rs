//! Cache inspection tools.
//!
//! Read-only views over the partition store; writes only happen through
//! worker events.

pub mod get;
pub mod partitions;

pub use get::{CacheGetParams, get_impl};
pub use partitions::{CachePartitionsParams, partitions_impl};
