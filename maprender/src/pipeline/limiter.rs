//! Semaphore-based limiter for concurrent tile fetches.
//!
//! Every network request made by a render holds a [`FetchPermit`] for its
//! whole duration, so no more than `max_concurrent` requests are ever open
//! against the tile server, however many grid cells a render has.
//!
//! ```ignore
//! let limiter = Arc::new(FetchLimiter::new(16));
//!
//! let _permit = limiter.acquire().await?;
//! provider.fetch_tile(tile).await?;
//! // permit released here
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Default number of simultaneous tile requests.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Limits how many tile fetches run at once.
#[derive(Debug)]
pub struct FetchLimiter {
    semaphore: Arc<Semaphore>,

    max_permits: usize,

    /// Shared with permits so they can outlive a borrow of the limiter
    in_flight: Arc<AtomicUsize>,

    /// Highest in-flight count observed
    peak_in_flight: AtomicUsize,
}

impl FetchLimiter {
    /// Creates a limiter allowing `max_concurrent` fetches.
    ///
    /// A value of 0 is raised to 1.
    pub fn new(max_concurrent: usize) -> Self {
        let max_permits = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_permits)),
            max_permits,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Waits for a free slot.
    ///
    /// Fails only if the semaphore was closed, which this type never does.
    pub async fn acquire(&self) -> Result<FetchPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.update_peak(current);

        Ok(FetchPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    /// Maximum number of concurrent fetches.
    pub fn max_concurrent(&self) -> usize {
        self.max_permits
    }

    /// Fetches currently holding a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of simultaneous fetches since creation.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}

/// Slot held for the duration of one fetch; released on drop.
#[derive(Debug)]
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for FetchPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_is_raised_to_one() {
        let limiter = FetchLimiter::new(0);
        assert_eq!(limiter.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn test_permit_tracking() {
        let limiter = FetchLimiter::new(4);

        let first = limiter.acquire().await.unwrap();
        let second = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);

        drop(first);
        assert_eq!(limiter.in_flight(), 1);
        drop(second);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_when_exhausted() {
        let limiter = Arc::new(FetchLimiter::new(1));
        let held = limiter.acquire().await.unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                let _permit = limiter.acquire().await.unwrap();
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let limiter = Arc::new(FetchLimiter::new(3));
        let mut handles = Vec::new();

        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await.unwrap();
                assert!(limiter.in_flight() <= 3);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(limiter.peak_in_flight() <= 3);
        assert_eq!(limiter.in_flight(), 0);
    }
}
