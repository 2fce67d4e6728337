//! Two-tier tile cache.
//!
//! ```text
//!   lookup(key) ──► MemoryTier (DashMap) ──► hit / miss
//!
//!   store(key, bytes) ──► DiskTier (temp file + rename) ──► MemoryTier
//! ```
//!
//! The disk tier is read once, when the cache is opened, and every file found
//! there becomes a memory entry keyed by its file name. During a render only
//! the memory tier is consulted; the disk tier just receives new tiles.
//!
//! # Retention
//!
//! Nothing is ever evicted. Both tiers grow for as long as the process runs
//! and the directory keeps every tile ever fetched. Pruning the directory is
//! left to whoever owns it.
//!
//! # Example
//!
//! ```ignore
//! use maprender::cache::{TileCache, TileKey};
//!
//! let cache = TileCache::open("/var/cache/maprender")?;
//! let key = TileKey::from_file_name("79233_40961_17.png");
//! if cache.lookup(&key).is_none() {
//!     cache.store(key, bytes).await?;
//! }
//! ```

mod disk;
mod key;
mod memory;

pub use disk::{DiskTier, LoadReport, LoadedTile};
pub use key::TileKey;
pub use memory::MemoryTier;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the disk tier.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory could not be listed.
    #[error("Cannot read cache directory {}: {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a tile file failed.
    #[error("Cache I/O error for {key}: {source}")]
    Io {
        key: TileKey,
        #[source]
        source: std::io::Error,
    },
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Tiles held in memory
    pub entries: usize,
    /// Bytes held in memory
    pub size_bytes: u64,
    /// Lookups that found a tile
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Successful stores
    pub stores: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles, {} bytes ({} hits, {} misses, {} stores)",
            self.entries, self.size_bytes, self.hits, self.misses, self.stores
        )
    }
}

/// Process-wide tile cache shared by every render.
///
/// Safe to use from any number of tasks at once; wrap it in an `Arc`.
#[derive(Debug)]
pub struct TileCache {
    memory: MemoryTier,
    disk: Option<DiskTier>,
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
}

impl TileCache {
    /// Opens the cache backed by `directory`, loading every tile file into
    /// memory.
    ///
    /// The directory must already exist. Individual unreadable files are
    /// skipped with a warning.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, CacheError> {
        let disk = DiskTier::new(directory.as_ref());
        let report = disk.load_all()?;

        let memory = MemoryTier::new();
        let loaded = report.tiles.len();
        for tile in report.tiles {
            memory.insert(tile.key, tile.data);
        }

        info!(
            dir = %disk.directory().display(),
            tiles = loaded,
            skipped = report.skipped,
            bytes = memory.size_bytes(),
            "Tile cache loaded"
        );

        Ok(Self::with_tiers(memory, Some(disk)))
    }

    /// Creates a cache without a disk tier.
    pub fn in_memory() -> Self {
        Self::with_tiers(MemoryTier::new(), None)
    }

    fn with_tiers(memory: MemoryTier, disk: Option<DiskTier>) -> Self {
        Self {
            memory,
            disk,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stores: AtomicU64::new(0),
        }
    }

    /// Looks up a tile in the memory tier.
    pub fn lookup(&self, key: &TileKey) -> Option<Bytes> {
        match self.memory.get(key) {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a freshly fetched tile.
    ///
    /// The file is written first and the memory entry inserted after, so a
    /// tile visible in memory is also on disk. Storing the same key twice is
    /// harmless; the last write wins.
    pub async fn store(&self, key: TileKey, data: Bytes) -> Result<(), CacheError> {
        if let Some(disk) = &self.disk {
            disk.write(&key, data.clone()).await?;
        }

        debug!(key = %key, bytes = data.len(), "Stored tile");
        self.memory.insert(key, data);
        self.stores.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Returns the cache directory, if this cache has a disk tier.
    pub fn directory(&self) -> Option<&Path> {
        self.disk.as_ref().map(DiskTier::directory)
    }

    /// Returns current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.memory.entry_count(),
            size_bytes: self.memory.size_bytes(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}
