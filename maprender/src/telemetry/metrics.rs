//! Lock-free per-render counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::RenderStats;

/// Counters for one render.
///
/// All updates use `Relaxed` ordering; the counters are independent and are
/// only read together after every tile task has finished.
#[derive(Debug)]
pub struct RenderMetrics {
    start_time: Instant,
    /// Grid cells in this render
    tiles_total: u64,
    /// Cells served from the memory tier
    cache_hits: AtomicU64,
    /// Provider requests actually issued
    network_fetches: AtomicU64,
    /// Cells that waited on another cell's fetch
    coalesced_waits: AtomicU64,
    /// Payload bytes received from the provider
    bytes_downloaded: AtomicU64,
    /// Cells blitted onto the canvas
    tiles_composited: AtomicU64,
}

impl RenderMetrics {
    /// Starts the clock for a render of `tiles_total` cells.
    pub fn new(tiles_total: u64) -> Self {
        Self {
            start_time: Instant::now(),
            tiles_total,
            cache_hits: AtomicU64::new(0),
            network_fetches: AtomicU64::new(0),
            coalesced_waits: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
            tiles_composited: AtomicU64::new(0),
        }
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a provider request. Counted when issued, before its outcome
    /// is known.
    pub fn fetch_started(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_completed(&self, bytes: u64) {
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn coalesced_wait(&self) {
        self.coalesced_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tile_composited(&self) {
        self.tiles_composited.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the counters into an immutable snapshot.
    pub fn snapshot(&self) -> RenderStats {
        RenderStats {
            elapsed: self.start_time.elapsed(),
            tiles_total: self.tiles_total,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            coalesced_waits: self.coalesced_waits.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            tiles_composited: self.tiles_composited.load(Ordering::Relaxed),
        }
    }
}
