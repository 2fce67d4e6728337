//! Point-in-time render statistics.

use std::fmt;
use std::time::Duration;

/// Immutable copy of a render's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Wall time from render start to snapshot
    pub elapsed: Duration,
    pub tiles_total: u64,
    pub cache_hits: u64,
    /// Provider requests issued, successful or not
    pub network_fetches: u64,
    pub coalesced_waits: u64,
    pub bytes_downloaded: u64,
    pub tiles_composited: u64,
}

impl RenderStats {
    /// Share of grid cells served from cache (0.0 to 1.0).
    pub fn cache_hit_rate(&self) -> f64 {
        if self.tiles_total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.tiles_total as f64
        }
    }

    /// Elapsed time in fractional seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles in {:.3}s: {} cached, {} fetched ({} bytes), {} coalesced",
            self.tiles_total,
            self.elapsed_secs(),
            self.cache_hits,
            self.network_fetches,
            self.bytes_downloaded,
            self.coalesced_waits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_rate() {
        let stats = RenderStats {
            tiles_total: 4,
            cache_hits: 3,
            ..Default::default()
        };
        assert!((stats.cache_hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(RenderStats::default().cache_hit_rate(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = RenderStats {
            elapsed: Duration::from_millis(1500),
            tiles_total: 12,
            cache_hits: 10,
            network_fetches: 2,
            coalesced_waits: 0,
            bytes_downloaded: 2048,
            tiles_composited: 12,
        };
        let text = stats.to_string();
        assert!(text.starts_with("12 tiles in 1.500s"));
        assert!(text.contains("2 fetched (2048 bytes)"));
    }
}
