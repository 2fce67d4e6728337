//! In-memory tile tier backed by `DashMap`.
//!
//! DashMap shards its locks, so lookups from many fetch tasks do not contend
//! on a single mutex and no lock is ever held across an `.await`.
//!
//! Entries are never evicted: the tier only grows for the life of the process.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;

use super::key::TileKey;

/// In-memory map from tile key to encoded tile bytes.
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: DashMap<TileKey, Bytes>,
    /// Sum of stored payload sizes
    size_bytes: AtomicU64,
}

impl MemoryTier {
    /// Creates an empty tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes stored for `key`, if any.
    ///
    /// `Bytes` clones share the underlying buffer.
    pub fn get(&self, key: &TileKey) -> Option<Bytes> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Inserts or replaces the bytes for `key`.
    pub fn insert(&self, key: TileKey, data: Bytes) {
        let added = data.len() as u64;
        match self.entries.insert(key, data) {
            Some(previous) => {
                // Same key stored twice (duplicate fetch): swap sizes
                self.size_bytes.fetch_add(added, Ordering::Relaxed);
                self.size_bytes
                    .fetch_sub(previous.len() as u64, Ordering::Relaxed);
            }
            None => {
                self.size_bytes.fetch_add(added, Ordering::Relaxed);
            }
        }
    }

    /// Number of stored tiles.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Total bytes held.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }
}
