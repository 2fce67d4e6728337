//! Fetch pipeline building blocks.
//!
//! - [`FetchLimiter`] bounds simultaneous network requests
//! - [`FetchCoalescer`] shares one fetch among grid cells naming the same tile

mod coalesce;
mod limiter;

pub use coalesce::{wait_for_leader, FetchCoalescer, LeaderGuard, Registration};
pub use limiter::{FetchLimiter, FetchPermit, DEFAULT_MAX_CONCURRENT_FETCHES};
