//! Render types and errors

use std::fmt;
use std::time::Duration;

use image::RgbaImage;

use crate::cache::{CacheError, TileKey};
use crate::compositor::{self, CompositorError};
use crate::coord::{CoordError, TileGrid};
use crate::pipeline::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::provider::ProviderError;
use crate::telemetry::RenderStats;

/// Default render timeout in seconds.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 120;

/// What went wrong with a single tile.
#[derive(Debug)]
pub enum TileErrorKind {
    /// The provider request failed
    Fetch(ProviderError),
    /// Writing the fetched tile to the cache failed
    Cache(CacheError),
    /// The tile bytes could not be decoded into a 256x256 image
    Composition(CompositorError),
}

impl fmt::Display for TileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileErrorKind::Fetch(e) => write!(f, "fetch failed: {}", e),
            TileErrorKind::Cache(e) => write!(f, "cache write failed: {}", e),
            TileErrorKind::Composition(e) => write!(f, "composition failed: {}", e),
        }
    }
}

/// Errors that end a render.
#[derive(Debug)]
pub enum RenderError {
    /// The viewport was rejected before any tile work started
    InvalidViewport(CoordError),
    /// A tile failed; the render was aborted
    Tile { key: TileKey, kind: TileErrorKind },
    /// The caller cancelled the render
    Cancelled,
    /// The render did not finish within the configured timeout
    TimedOut(Duration),
    /// A tile task panicked or could not be joined
    TaskFailed(String),
}

impl RenderError {
    /// The failing tile, if the render failed on one.
    pub fn tile_key(&self) -> Option<&TileKey> {
        match self {
            RenderError::Tile { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidViewport(e) => write!(f, "Invalid viewport: {}", e),
            RenderError::Tile { key, kind } => write!(f, "Tile {}: {}", key, kind),
            RenderError::Cancelled => write!(f, "Render cancelled"),
            RenderError::TimedOut(limit) => {
                write!(f, "Render timed out after {}s", limit.as_secs_f64())
            }
            RenderError::TaskFailed(msg) => write!(f, "Tile task failed: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::InvalidViewport(e) => Some(e),
            RenderError::Tile { kind, .. } => match kind {
                TileErrorKind::Fetch(e) => Some(e),
                TileErrorKind::Cache(e) => Some(e),
                TileErrorKind::Composition(e) => Some(e),
            },
            _ => None,
        }
    }
}

impl From<CoordError> for RenderError {
    fn from(e: CoordError) -> Self {
        RenderError::InvalidViewport(e)
    }
}

/// Tunables for a [`MapRenderer`](super::MapRenderer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Provider requests allowed in flight at once, across all renders
    pub max_concurrent_fetches: usize,
    /// Share one fetch among grid cells naming the same tile
    pub coalesce_fetches: bool,
    /// Abort renders running longer than this
    pub render_timeout: Option<Duration>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            coalesce_fetches: true,
            render_timeout: Some(Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS)),
        }
    }
}

/// A finished render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Canvas of exactly the viewport's size
    pub image: RgbaImage,
    /// Tile grid the canvas was assembled from
    pub grid: TileGrid,
    pub stats: RenderStats,
}

impl RenderOutput {
    /// Encodes the canvas as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CompositorError> {
        compositor::encode_png(&self.image)
    }
}
