//! Render telemetry.
//!
//! Each render owns one [`RenderMetrics`]; tile tasks bump its atomic
//! counters and the render returns a [`RenderStats`] snapshot when it ends.
//! Nothing here is process-wide, so concurrent renders never see each
//! other's counts.
//!
//! ```text
//! tile tasks ─────► RenderMetrics ─────► RenderStats ─────► CLI / caller
//!                   (atomic counters)    (snapshot)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use maprender::telemetry::RenderMetrics;
//!
//! let metrics = RenderMetrics::new(12);
//! metrics.cache_hit();
//! metrics.fetch_started();
//! metrics.fetch_completed(4_096);
//! let stats = metrics.snapshot();
//! println!("{}", stats);
//! ```

mod metrics;
mod snapshot;

pub use metrics::RenderMetrics;
pub use snapshot::RenderStats;
