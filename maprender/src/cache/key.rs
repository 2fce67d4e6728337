//! Cache keys for tiles.
//!
//! A key is the tile's file name in the cache directory:
//! `{x}_{y}_{zoom}.{ext}`, e.g. `79233_40961_17.png`. The same string keys the
//! in-memory tier, so a file found on disk at startup is addressable without
//! any translation.

use std::fmt;
use std::sync::Arc;

use crate::coord::TileCoord;

/// Identifies one cached tile after wraparound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(Arc<str>);

impl TileKey {
    /// Builds the key for `tile` stored with file extension `extension`.
    pub fn for_tile(tile: &TileCoord, extension: &str) -> Self {
        Self(format!("{}_{}_{}.{}", tile.x, tile.y, tile.zoom, extension).into())
    }

    /// Wraps an existing file name as a key.
    pub fn from_file_name(name: &str) -> Self {
        Self(name.into())
    }

    /// Returns the key as a file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TileKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
