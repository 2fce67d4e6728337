//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator tile coordinates, and computes the block of tiles that
//! covers a pixel viewport.
//!
//! Everything here is pure: no I/O, no allocation, no shared state.

mod types;

pub use types::{
    CoordError, FractionalTilePos, GeoPoint, GridCell, GridCells, TileCoord, TileGrid, Viewport,
    MAX_DIMENSION, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Returns the number of tiles along one axis at `zoom` (`2^zoom`).
///
/// Zoom levels above [`MAX_ZOOM`] are treated as [`MAX_ZOOM`].
#[inline]
pub fn num_tiles_at_zoom(zoom: u8) -> u32 {
    1u32 << zoom.min(MAX_ZOOM)
}

/// Converts a geographic point to its continuous tile-space position.
///
/// Latitude is clamped to the Web Mercator limit so the result stays finite
/// near the poles, and zoom is capped at [`MAX_ZOOM`].
#[inline]
pub fn world_to_tile(point: GeoPoint, zoom: u8) -> FractionalTilePos {
    let zoom = zoom.min(MAX_ZOOM);
    let n = num_tiles_at_zoom(zoom) as f64;
    let lat = point.lat.clamp(MIN_LAT, MAX_LAT);

    let x = (point.lon + 180.0) / 360.0 * n;

    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    FractionalTilePos { x, y, zoom }
}

/// Converts a tile-space position back to geographic coordinates.
///
/// For integral positions this is the tile's north-west corner.
#[inline]
pub fn tile_to_geo(pos: FractionalTilePos) -> GeoPoint {
    let n = num_tiles_at_zoom(pos.zoom) as f64;

    let lon = pos.x / n * 360.0 - 180.0;

    let y = pos.y / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    GeoPoint { lon, lat }
}

/// Wraps an absolute tile index into `[0, n)`.
///
/// Negative indices wrap forward, so `-1` becomes `n - 1` and `n` becomes `0`.
#[inline]
pub fn wrap_tile_index(value: i64, n: i64) -> u32 {
    (((value % n) + n) % n) as u32
}

/// Computes the tile grid covering a `width`×`height` viewport centered on
/// `center`.
#[inline]
pub fn compute_grid(center: GeoPoint, zoom: u8, width: u32, height: u32) -> TileGrid {
    TileGrid::from_center_tile(world_to_tile(center, zoom), width, height)
}

impl TileGrid {
    /// Computes the grid for a viewport whose center sits at `center` in tile
    /// space.
    pub fn from_center_tile(center: FractionalTilePos, width: u32, height: u32) -> Self {
        let tile_size = TILE_SIZE as f64;

        // Half the viewport expressed in tiles: size / 2 / 256
        let xs = center.x - width as f64 / (2.0 * tile_size);
        let ys = center.y - height as f64 / (2.0 * tile_size);

        let (x_start, x_pixel_offset) = split_axis(xs);
        let (y_start, y_pixel_offset) = split_axis(ys);

        Self {
            x_start,
            y_start,
            x_count: tiles_spanned(width, x_pixel_offset),
            y_count: tiles_spanned(height, y_pixel_offset),
            x_pixel_offset,
            y_pixel_offset,
        }
    }
}

/// Tiles needed to cover `size` pixels starting `offset` pixels into the
/// first tile.
#[inline]
fn tiles_spanned(size: u32, offset: u32) -> u32 {
    // Widened so u32::MAX sizes cannot overflow; the quotient always fits
    ((size as u64 + offset as u64).div_ceil(TILE_SIZE as u64)) as u32
}

/// Splits a tile-space coordinate into its tile index and the pixel offset
/// inside that tile.
#[inline]
fn split_axis(value: f64) -> (i64, u32) {
    let start = value.floor();
    // value - floor(value) can round up to exactly 1.0 for tiny negatives
    let offset = ((value - start) * TILE_SIZE as f64) as u32;
    (start as i64, offset.min(TILE_SIZE - 1))
}
