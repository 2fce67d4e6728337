//! Coordinate type definitions

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the tile math.
///
/// Providers usually support a narrower range; the renderer checks the
/// provider's own limits on top of this.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 24;

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Largest accepted viewport width or height in pixels.
///
/// Bounds the canvas at 256 MiB of RGBA and a render at 33×33 tiles.
pub const MAX_DIMENSION: u32 = 8192;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude, positive east
    pub lon: f64,
    /// Latitude, positive north
    pub lat: f64,
}

impl GeoPoint {
    /// Creates a point from longitude and latitude (in that order).
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Tile coordinates in the Web Mercator / Slippy Map system.
///
/// `x` and `y` are always inside `[0, 2^zoom)`; indices outside that range
/// are wrapped before a `TileCoord` is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Column (east-west), 0 at the antimeridian
    pub x: u32,
    /// Row (north-south), 0 at north
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

/// Continuous tile-space position of a point, before flooring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalTilePos {
    pub x: f64,
    pub y: f64,
    pub zoom: u8,
}

/// The requested output: where, how close, and how many pixels.
///
/// Construct with [`Viewport::new`], which rejects empty or oversized images,
/// unknown zoom levels and non-finite or out-of-range coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    center: GeoPoint,
    zoom: u8,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Creates a validated viewport.
    pub fn new(center: GeoPoint, zoom: u8, width: u32, height: u32) -> Result<Self, CoordError> {
        if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
            return Err(CoordError::InvalidDimensions { width, height });
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return Err(CoordError::InvalidZoom(zoom));
        }
        if !center.lat.is_finite() || !(-90.0..=90.0).contains(&center.lat) {
            return Err(CoordError::InvalidLatitude(center.lat));
        }
        if !center.lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&center.lon) {
            return Err(CoordError::InvalidLongitude(center.lon));
        }

        Ok(Self {
            center,
            zoom,
            width,
            height,
        })
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Computes the tile grid covering this viewport.
    pub fn grid(&self) -> TileGrid {
        super::compute_grid(self.center, self.zoom, self.width, self.height)
    }
}

/// The block of tiles covering a viewport.
///
/// `x_start`/`y_start` are absolute tile indices and may fall outside
/// `[0, 2^zoom)`; [`TileGrid::cells`] wraps them. The pixel offsets locate the
/// top-left output pixel inside the top-left tile and are always in
/// `[0, 256)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub x_start: i64,
    pub y_start: i64,
    pub x_count: u32,
    pub y_count: u32,
    pub x_pixel_offset: u32,
    pub y_pixel_offset: u32,
}

impl TileGrid {
    /// Total number of tiles in the grid.
    pub fn tile_count(&self) -> usize {
        self.x_count as usize * self.y_count as usize
    }

    /// Returns an iterator over every cell of the grid at `zoom`.
    ///
    /// Cells are yielded in row-major order.
    pub fn cells(&self, zoom: u8) -> GridCells {
        GridCells {
            grid: *self,
            zoom,
            current: 0,
        }
    }
}

/// One cell of a [`TileGrid`]: the tile to draw and where it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// Column inside the grid (0-based)
    pub col: u32,
    /// Row inside the grid (0-based)
    pub row: u32,
    /// Tile after wraparound
    pub tile: TileCoord,
    /// Canvas x of the tile's top-left corner; negative at the left edge
    pub offset_x: i64,
    /// Canvas y of the tile's top-left corner; negative at the top edge
    pub offset_y: i64,
}

/// Iterator over the cells of a [`TileGrid`].
#[derive(Debug, Clone)]
pub struct GridCells {
    grid: TileGrid,
    zoom: u8,
    current: usize,
}

impl Iterator for GridCells {
    type Item = GridCell;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.grid.tile_count() {
            return None;
        }

        let col = (self.current % self.grid.x_count as usize) as u32;
        let row = (self.current / self.grid.x_count as usize) as u32;
        self.current += 1;

        let n = super::num_tiles_at_zoom(self.zoom) as i64;
        let tile = TileCoord {
            x: super::wrap_tile_index(self.grid.x_start + col as i64, n),
            y: super::wrap_tile_index(self.grid.y_start + row as i64, n),
            zoom: self.zoom,
        };

        Some(GridCell {
            col,
            row,
            tile,
            offset_x: col as i64 * TILE_SIZE as i64 - self.grid.x_pixel_offset as i64,
            offset_y: row as i64 * TILE_SIZE as i64 - self.grid.y_pixel_offset as i64,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.tile_count() - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridCells {}

/// Errors that can occur while validating a viewport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Width or height is zero or above [`MAX_DIMENSION`]
    #[error("Invalid viewport size {width}x{height} (each side must be between 1 and 8192)")]
    InvalidDimensions { width: u32, height: u32 },

    /// Zoom level is outside the supported range
    #[error("Invalid zoom level: {0} (must be between 0 and 24)")]
    InvalidZoom(u8),

    /// Latitude is not a finite value in [-90, 90]
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude is not a finite value in [-180, 180]
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
}
