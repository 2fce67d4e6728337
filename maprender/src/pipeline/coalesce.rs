//! Fetch coalescing within a render.
//!
//! Several grid cells can name the same tile (at low zoom the grid wraps
//! around the world). The first cell to miss the cache becomes the leader
//! and fetches; later cells subscribe and receive the leader's bytes.
//!
//! ```text
//! cell A ─┐
//! cell B ─┼──► FetchCoalescer ──► leader fetch (A) ──► provider
//! cell C ─┘         │                    │
//!                   ▼                    ▼
//!              B, C wait  ◄──── broadcast bytes
//! ```
//!
//! If the leader is dropped without completing (fetch failed, task aborted)
//! the channel closes and waiters register again; one of them becomes the
//! new leader.

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::cache::TileKey;

/// Tracks tiles currently being fetched by a render.
#[derive(Debug, Default)]
pub struct FetchCoalescer {
    in_flight: DashMap<TileKey, broadcast::Sender<Bytes>>,
}

/// Outcome of [`FetchCoalescer::register`].
pub enum Registration<'a> {
    /// The caller must fetch and then call [`LeaderGuard::complete`].
    Leader(LeaderGuard<'a>),
    /// Another task is fetching; wait with [`wait_for_leader`].
    Follower(broadcast::Receiver<Bytes>),
}

impl FetchCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in `key`.
    pub fn register(&self, key: &TileKey) -> Registration<'_> {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                debug!(key = %key, "Waiting for in-flight fetch");
                Registration::Follower(entry.get().subscribe())
            }
            Entry::Vacant(entry) => {
                // One message is ever sent per channel
                let (tx, _rx) = broadcast::channel(1);
                entry.insert(tx);
                Registration::Leader(LeaderGuard {
                    coalescer: self,
                    key: key.clone(),
                    completed: false,
                })
            }
        }
    }
}

/// Leadership over one in-flight tile.
///
/// Dropping the guard without calling [`complete`](Self::complete) releases
/// the tile so waiters can retry.
pub struct LeaderGuard<'a> {
    coalescer: &'a FetchCoalescer,
    key: TileKey,
    completed: bool,
}

impl LeaderGuard<'_> {
    /// Publishes `data` to every waiter and releases the tile.
    pub fn complete(mut self, data: Bytes) {
        self.completed = true;
        if let Some((_, tx)) = self.coalescer.in_flight.remove(&self.key) {
            let waiters = tx.receiver_count();
            // No receivers is fine
            let _ = tx.send(data);
            if waiters > 0 {
                debug!(key = %self.key, waiters, "Shared fetched tile");
            }
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            // Dropping the sender closes the channel for waiters
            self.coalescer.in_flight.remove(&self.key);
            debug!(key = %self.key, "Fetch abandoned, releasing waiters");
        }
    }
}

/// Waits for the leader's bytes.
///
/// Returns `None` when the leader gave up; the caller should register again.
pub async fn wait_for_leader(mut rx: broadcast::Receiver<Bytes>) -> Option<Bytes> {
    rx.recv().await.ok()
}
