//! Canvas assembly.
//!
//! Tiles arrive in any order from concurrent fetch tasks. Each one is decoded
//! and blitted onto a single shared canvas; the canvas lock is the only
//! synchronisation between tasks and is held for one blit at a time.
//!
//! Decoding and blitting are CPU work. Callers on the async runtime run them
//! through `tokio::task::spawn_blocking`.

use std::io::Cursor;

use image::{imageops, ImageFormat, RgbaImage};
use parking_lot::Mutex;
use thiserror::Error;

use crate::coord::TILE_SIZE;

/// Errors from decoding or encoding images.
#[derive(Debug, Error)]
pub enum CompositorError {
    /// Bytes are not a decodable image.
    #[error("Tile decode failed: {0}")]
    Decode(#[source] image::ImageError),

    /// Decoded image is not a 256x256 tile.
    #[error("Tile is {width}x{height}, expected 256x256")]
    UnexpectedSize { width: u32, height: u32 },

    /// Encoding the finished canvas failed.
    #[error("PNG encode failed: {0}")]
    Encode(#[source] image::ImageError),
}

/// Output canvas shared by all tile tasks of one render.
#[derive(Debug)]
pub struct Compositor {
    canvas: Mutex<RgbaImage>,
}

impl Compositor {
    /// Creates a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Mutex::new(RgbaImage::new(width, height)),
        }
    }

    /// Canvas dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.lock().dimensions()
    }

    /// Copies `tile` onto the canvas with its top-left corner at
    /// (`offset_x`, `offset_y`).
    ///
    /// Offsets may be negative or past the canvas edge; whatever falls
    /// outside is clipped.
    pub fn submit(&self, tile: &RgbaImage, offset_x: i64, offset_y: i64) {
        let mut canvas = self.canvas.lock();
        imageops::replace(&mut *canvas, tile, offset_x, offset_y);
    }

    /// Consumes the compositor and returns the canvas.
    pub fn finalize(self) -> RgbaImage {
        self.canvas.into_inner()
    }
}

/// Decodes encoded tile bytes into RGBA pixels.
pub fn decode_tile(data: &[u8]) -> Result<RgbaImage, CompositorError> {
    let tile = image::load_from_memory(data)
        .map_err(CompositorError::Decode)?
        .to_rgba8();

    let (width, height) = tile.dimensions();
    if width != TILE_SIZE || height != TILE_SIZE {
        return Err(CompositorError::UnexpectedSize { width, height });
    }
    Ok(tile)
}

/// Encodes an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CompositorError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(CompositorError::Encode)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn solid_tile(color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, color)
    }

    #[test]
    fn test_new_canvas_is_transparent() {
        let compositor = Compositor::new(10, 5);
        assert_eq!(compositor.dimensions(), (10, 5));
        let canvas = compositor.finalize();
        assert!(canvas.pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn test_submit_negative_offset_clips() {
        let compositor = Compositor::new(300, 300);

        compositor.submit(&solid_tile(RED), -200, -100);

        let canvas = compositor.finalize();
        assert_eq!(*canvas.get_pixel(0, 0), RED);
        assert_eq!(*canvas.get_pixel(55, 155), RED);
        assert_eq!(*canvas.get_pixel(56, 0), CLEAR);
        assert_eq!(*canvas.get_pixel(0, 156), CLEAR);
    }

    #[test]
    fn test_submit_past_edge_clips() {
        let compositor = Compositor::new(300, 100);

        compositor.submit(&solid_tile(RED), 200, 50);
        compositor.submit(&solid_tile(RED), 1000, 1000);

        let canvas = compositor.finalize();
        assert_eq!(*canvas.get_pixel(199, 50), CLEAR);
        assert_eq!(*canvas.get_pixel(200, 50), RED);
        assert_eq!(*canvas.get_pixel(299, 99), RED);
        assert_eq!(*canvas.get_pixel(200, 49), CLEAR);
    }

    #[test]
    fn test_tile_larger_than_canvas() {
        let compositor = Compositor::new(100, 100);
        compositor.submit(&solid_tile(RED), -50, -50);
        let canvas = compositor.finalize();
        assert!(canvas.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_decode_tile_roundtrip() {
        let encoded = encode_png(&solid_tile(RED)).unwrap();
        let decoded = decode_tile(&encoded).unwrap();
        assert_eq!(decoded.dimensions(), (TILE_SIZE, TILE_SIZE));
        assert_eq!(*decoded.get_pixel(128, 128), RED);
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let encoded = encode_png(&RgbaImage::new(512, 512)).unwrap();
        assert!(matches!(
            decode_tile(&encoded),
            Err(CompositorError::UnexpectedSize {
                width: 512,
                height: 512
            })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_tile(b"not an image"),
            Err(CompositorError::Decode(_))
        ));
    }

    #[test]
    fn test_concurrent_submits() {
        use std::sync::Arc;

        let compositor = Arc::new(Compositor::new(512, 256));
        let handles: Vec<_> = [0i64, 256]
            .into_iter()
            .map(|x| {
                let compositor = Arc::clone(&compositor);
                std::thread::spawn(move || compositor.submit(&solid_tile(RED), x, 0))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let canvas = Arc::try_unwrap(compositor).unwrap().finalize();
        assert!(canvas.pixels().all(|p| *p == RED));
    }
}
