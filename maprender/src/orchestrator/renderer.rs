//! Viewport rendering implementation

use std::future;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{RenderConfig, RenderError, RenderOutput, TileErrorKind};
use crate::cache::{TileCache, TileKey};
use crate::compositor::{decode_tile, Compositor, CompositorError};
use crate::coord::{CoordError, GridCell, TileCoord, Viewport};
use crate::pipeline::{wait_for_leader, FetchCoalescer, FetchLimiter, Registration};
use crate::provider::AsyncProvider;
use crate::telemetry::RenderMetrics;

/// Renders viewports from a tile provider through a shared tile cache.
///
/// One renderer can serve many renders at once. They share the cache and the
/// fetch limiter; everything else (canvas, counters, coalescing table) is
/// created per render.
///
/// # Example
///
/// ```ignore
/// use maprender::cache::TileCache;
/// use maprender::coord::{GeoPoint, Viewport};
/// use maprender::orchestrator::{MapRenderer, RenderConfig};
/// use maprender::provider::{AsyncReqwestClient, SlippyTileProvider};
/// use std::sync::Arc;
///
/// let provider = Arc::new(SlippyTileProvider::new(AsyncReqwestClient::new()?));
/// let cache = Arc::new(TileCache::open("/var/cache/maprender")?);
/// let renderer = MapRenderer::new(provider, cache, RenderConfig::default());
///
/// let viewport = Viewport::new(GeoPoint::new(37.617635, 55.755821), 17, 900, 100)?;
/// let output = renderer.render(&viewport).await?;
/// println!("{} network fetches", output.stats.network_fetches);
/// ```
pub struct MapRenderer<P: AsyncProvider> {
    provider: Arc<P>,
    cache: Arc<TileCache>,
    limiter: Arc<FetchLimiter>,
    config: RenderConfig,
}

impl<P: AsyncProvider + 'static> MapRenderer<P> {
    /// Creates a renderer.
    pub fn new(provider: Arc<P>, cache: Arc<TileCache>, config: RenderConfig) -> Self {
        let limiter = Arc::new(FetchLimiter::new(config.max_concurrent_fetches));
        Self {
            provider,
            cache,
            limiter,
            config,
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders `viewport`.
    ///
    /// Fails with the first tile error; remaining tile tasks are aborted.
    pub async fn render(&self, viewport: &Viewport) -> Result<RenderOutput, RenderError> {
        self.render_with_cancellation(viewport, CancellationToken::new())
            .await
    }

    /// Renders `viewport`, giving up when `cancel` fires.
    pub async fn render_with_cancellation(
        &self,
        viewport: &Viewport,
        cancel: CancellationToken,
    ) -> Result<RenderOutput, RenderError> {
        if !self.provider.supports_zoom(viewport.zoom()) {
            return Err(CoordError::InvalidZoom(viewport.zoom()).into());
        }

        let grid = viewport.grid();
        let job = Arc::new(RenderJob {
            provider: Arc::clone(&self.provider),
            cache: Arc::clone(&self.cache),
            limiter: Arc::clone(&self.limiter),
            coalescer: self.config.coalesce_fetches.then(FetchCoalescer::new),
            compositor: Compositor::new(viewport.width(), viewport.height()),
            metrics: RenderMetrics::new(grid.tile_count() as u64),
            extension: self.provider.extension().to_string(),
        });

        info!(
            provider = self.provider.name(),
            lat = viewport.center().lat,
            lon = viewport.center().lon,
            zoom = viewport.zoom(),
            width = viewport.width(),
            height = viewport.height(),
            tiles = grid.tile_count(),
            max_concurrent_fetches = self.limiter.max_concurrent(),
            fetches_in_flight = self.limiter.in_flight(),
            "Render started"
        );

        let mut tasks = JoinSet::new();
        for cell in grid.cells(viewport.zoom()) {
            let job = Arc::clone(&job);
            tasks.spawn(async move { job.render_cell(cell).await });
        }

        let deadline = self.config.render_timeout;
        let outcome = tokio::select! {
            result = join_all(&mut tasks) => result,
            _ = cancel.cancelled() => Err(RenderError::Cancelled),
            _ = async {
                match deadline {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => future::pending::<()>().await,
                }
            } => Err(RenderError::TimedOut(deadline.unwrap_or_default())),
        };

        if let Err(e) = outcome {
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
            warn!(error = %e, "Render failed");
            return Err(e);
        }

        let job = Arc::try_unwrap(job)
            .map_err(|_| RenderError::TaskFailed("render state still shared".to_string()))?;
        let stats = job.metrics.snapshot();
        let image = job.compositor.finalize();

        info!(
            elapsed_secs = stats.elapsed_secs(),
            cache_hits = stats.cache_hits,
            network_fetches = stats.network_fetches,
            coalesced = stats.coalesced_waits,
            peak_fetches_in_flight = self.limiter.peak_in_flight(),
            "Render complete"
        );

        Ok(RenderOutput { image, grid, stats })
    }
}

/// Waits for every tile task, stopping at the first failure.
async fn join_all(tasks: &mut JoinSet<Result<(), RenderError>>) -> Result<(), RenderError> {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(RenderError::TaskFailed(e.to_string())),
        }
    }
    Ok(())
}

/// State shared by the tile tasks of one render.
struct RenderJob<P> {
    provider: Arc<P>,
    cache: Arc<TileCache>,
    limiter: Arc<FetchLimiter>,
    coalescer: Option<FetchCoalescer>,
    compositor: Compositor,
    metrics: RenderMetrics,
    extension: String,
}

impl<P: AsyncProvider + 'static> RenderJob<P> {
    /// Resolves one cell's tile and draws it.
    async fn render_cell(self: Arc<Self>, cell: GridCell) -> Result<(), RenderError> {
        let key = TileKey::for_tile(&cell.tile, &self.extension);
        let data = self.resolve(&key, cell.tile).await?;

        let job = Arc::clone(&self);
        let drawn = tokio::task::spawn_blocking(move || {
            let tile = decode_tile(&data)?;
            job.compositor.submit(&tile, cell.offset_x, cell.offset_y);
            job.metrics.tile_composited();
            Ok::<(), CompositorError>(())
        })
        .await
        .map_err(|e| RenderError::TaskFailed(e.to_string()))?;

        drawn.map_err(|e| RenderError::Tile {
            key,
            kind: TileErrorKind::Composition(e),
        })
    }

    /// Returns the tile's bytes from the cache, a sibling cell's fetch, or the
    /// provider.
    async fn resolve(&self, key: &TileKey, tile: TileCoord) -> Result<Bytes, RenderError> {
        let Some(coalescer) = &self.coalescer else {
            if let Some(data) = self.cache_lookup(key) {
                return Ok(data);
            }
            return self.fetch_and_store(key, tile).await;
        };

        loop {
            if let Some(data) = self.cache_lookup(key) {
                return Ok(data);
            }

            match coalescer.register(key) {
                Registration::Leader(guard) => {
                    // A previous leader may have stored it since our lookup
                    if let Some(data) = self.cache_lookup(key) {
                        guard.complete(data.clone());
                        return Ok(data);
                    }
                    let data = self.fetch_and_store(key, tile).await?;
                    guard.complete(data.clone());
                    return Ok(data);
                }
                Registration::Follower(rx) => {
                    if let Some(data) = wait_for_leader(rx).await {
                        self.metrics.coalesced_wait();
                        return Ok(data);
                    }
                    debug!(key = %key, "Leader fetch abandoned, retrying");
                }
            }
        }
    }

    fn cache_lookup(&self, key: &TileKey) -> Option<Bytes> {
        let data = self.cache.lookup(key)?;
        self.metrics.cache_hit();
        Some(data)
    }

    /// Fetches from the provider under a limiter permit and stores the result.
    async fn fetch_and_store(&self, key: &TileKey, tile: TileCoord) -> Result<Bytes, RenderError> {
        let data = {
            let _permit = self
                .limiter
                .acquire()
                .await
                .map_err(|e| RenderError::TaskFailed(e.to_string()))?;

            self.metrics.fetch_started();
            self.provider
                .fetch_tile(tile)
                .await
                .map_err(|e| RenderError::Tile {
                    key: key.clone(),
                    kind: TileErrorKind::Fetch(e),
                })?
        };
        self.metrics.fetch_completed(data.len() as u64);

        self.cache
            .store(key.clone(), data.clone())
            .await
            .map_err(|e| RenderError::Tile {
                key: key.clone(),
                kind: TileErrorKind::Cache(e),
            })?;

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::encode_png;
    use crate::coord::{GeoPoint, TILE_SIZE};
    use crate::provider::ProviderError;
    use image::{Rgba, RgbaImage};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Serves a solid tile whose red channel encodes `x % 256`.
    struct MockProvider {
        fetches: AtomicUsize,
        requested: Mutex<Vec<TileCoord>>,
        fail_on: Option<TileCoord>,
        delay: Duration,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                requested: Mutex::new(Vec::new()),
                fail_on: None,
                delay: Duration::ZERO,
            }
        }

        fn failing_on(tile: TileCoord) -> Self {
            Self {
                fail_on: Some(tile),
                ..Self::new()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    fn tile_png(tile: TileCoord) -> Bytes {
        let color = Rgba([(tile.x % 256) as u8, (tile.y % 256) as u8, tile.zoom, 255]);
        let image = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, color);
        Bytes::from(encode_png(&image).unwrap())
    }

    impl AsyncProvider for MockProvider {
        async fn fetch_tile(&self, tile: TileCoord) -> Result<Bytes, ProviderError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().push(tile);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_on == Some(tile) {
                return Err(ProviderError::HttpError("HTTP 500".to_string()));
            }
            Ok(tile_png(tile))
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn extension(&self) -> &str {
            "png"
        }

        fn min_zoom(&self) -> u8 {
            0
        }

        fn max_zoom(&self) -> u8 {
            19
        }
    }

    fn renderer(provider: MockProvider, cache: TileCache) -> MapRenderer<MockProvider> {
        MapRenderer::new(
            Arc::new(provider),
            Arc::new(cache),
            RenderConfig::default(),
        )
    }

    fn moscow(width: u32, height: u32) -> Viewport {
        Viewport::new(GeoPoint::new(37.617635, 55.755821), 17, width, height).unwrap()
    }

    #[tokio::test]
    async fn test_cold_render_fetches_each_tile_once() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(MockProvider::new(), TileCache::open(dir.path()).unwrap());
        let viewport = moscow(900, 100);

        let output = renderer.render(&viewport).await.unwrap();

        let expected = output.grid.tile_count();
        assert_eq!(output.image.dimensions(), (900, 100));
        assert_eq!(output.stats.network_fetches as usize, expected);
        assert_eq!(renderer.provider().fetch_count(), expected);
        assert_eq!(output.stats.tiles_composited as usize, expected);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), expected);
    }

    #[tokio::test]
    async fn test_second_render_is_served_from_cache() {
        let renderer = renderer(MockProvider::new(), TileCache::in_memory());
        let viewport = moscow(900, 100);

        let first = renderer.render(&viewport).await.unwrap();
        let second = renderer.render(&viewport).await.unwrap();

        assert_eq!(second.stats.network_fetches, 0);
        assert_eq!(second.stats.cache_hits as usize, second.grid.tile_count());
        assert_eq!(first.image, second.image);
    }

    #[tokio::test]
    async fn test_canvas_pixels_come_from_expected_tiles() {
        let renderer = renderer(MockProvider::new(), TileCache::in_memory());
        let viewport = moscow(900, 100);

        let output = renderer.render(&viewport).await.unwrap();

        let grid = output.grid;
        let top_left = output.image.get_pixel(0, 0);
        assert_eq!(top_left[0], (grid.x_start % 256) as u8);
        assert_eq!(top_left[1], (grid.y_start % 256) as u8);

        let x = 899u32;
        let col = (x + grid.x_pixel_offset) / TILE_SIZE;
        let right = output.image.get_pixel(x, 0);
        assert_eq!(right[0], ((grid.x_start + col as i64) % 256) as u8);
    }

    #[tokio::test]
    async fn test_tile_seams_land_on_exact_pixels() {
        let renderer = renderer(MockProvider::new(), TileCache::in_memory());
        let viewport = moscow(900, 300);

        let output = renderer.render(&viewport).await.unwrap();
        let grid = output.grid;
        let image = &output.image;
        assert!(grid.x_count >= 2 && grid.y_count >= 2);

        let red_of_col = |col: u32| ((grid.x_start + col as i64) % 256) as u8;
        let green_of_row = |row: u32| ((grid.y_start + row as i64) % 256) as u8;

        for col in 1..grid.x_count {
            let seam = col * TILE_SIZE - grid.x_pixel_offset;
            if seam >= image.width() {
                continue;
            }
            assert_eq!(image.get_pixel(seam - 1, 0)[0], red_of_col(col - 1), "x seam {}", seam);
            assert_eq!(image.get_pixel(seam, 0)[0], red_of_col(col), "x seam {}", seam);
        }

        for row in 1..grid.y_count {
            let seam = row * TILE_SIZE - grid.y_pixel_offset;
            if seam >= image.height() {
                continue;
            }
            assert_eq!(image.get_pixel(0, seam - 1)[1], green_of_row(row - 1), "y seam {}", seam);
            assert_eq!(image.get_pixel(0, seam)[1], green_of_row(row), "y seam {}", seam);
        }
    }

    #[tokio::test]
    async fn test_zoom_zero_wraparound_is_coalesced() {
        let renderer = renderer(MockProvider::new(), TileCache::in_memory());
        let viewport = Viewport::new(GeoPoint::new(0.0, 0.0), 0, 1024, 256).unwrap();

        let output = renderer.render(&viewport).await.unwrap();

        assert!(output.grid.tile_count() > 1);
        assert_eq!(renderer.provider().fetch_count(), 1);
        assert_eq!(output.stats.network_fetches, 1);
        let unique: HashSet<_> = renderer.provider().requested.lock().iter().copied().collect();
        assert_eq!(unique.len(), 1);
    }

    #[tokio::test]
    async fn test_without_coalescing_duplicates_are_fetched() {
        let config = RenderConfig {
            coalesce_fetches: false,
            ..RenderConfig::default()
        };
        let renderer = MapRenderer::new(
            Arc::new(MockProvider::slow(Duration::from_millis(20))),
            Arc::new(TileCache::in_memory()),
            config,
        );
        let viewport = Viewport::new(GeoPoint::new(0.0, 0.0), 0, 1024, 256).unwrap();

        let output = renderer.render(&viewport).await.unwrap();

        assert_eq!(
            renderer.provider().fetch_count(),
            output.grid.tile_count()
        );
    }

    #[tokio::test]
    async fn test_failed_tile_fails_render_with_its_key() {
        let viewport = moscow(900, 100);
        let failing = viewport.grid().cells(17).nth(1).unwrap().tile;
        let renderer = renderer(MockProvider::failing_on(failing), TileCache::in_memory());

        let err = renderer.render(&viewport).await.unwrap_err();

        let expected = TileKey::for_tile(&failing, "png");
        assert_eq!(err.tile_key(), Some(&expected));
        assert!(matches!(
            err,
            RenderError::Tile {
                kind: TileErrorKind::Fetch(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_tile_is_composition_error() {
        let cache = TileCache::in_memory();
        let viewport = moscow(256, 256);
        for cell in viewport.grid().cells(17) {
            cache
                .store(
                    TileKey::for_tile(&cell.tile, "png"),
                    Bytes::from_static(b"garbage"),
                )
                .await
                .unwrap();
        }
        let renderer = renderer(MockProvider::new(), cache);

        let err = renderer.render(&viewport).await.unwrap_err();

        assert!(matches!(
            err,
            RenderError::Tile {
                kind: TileErrorKind::Composition(_),
                ..
            }
        ));
        assert_eq!(renderer.provider().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_zoom_rejected_before_work() {
        let renderer = renderer(MockProvider::new(), TileCache::in_memory());
        let viewport = Viewport::new(GeoPoint::new(0.0, 0.0), 22, 256, 256).unwrap();

        let err = renderer.render(&viewport).await.unwrap_err();

        assert!(matches!(
            err,
            RenderError::InvalidViewport(CoordError::InvalidZoom(22))
        ));
        assert_eq!(renderer.provider().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_render() {
        let renderer = renderer(
            MockProvider::slow(Duration::from_secs(30)),
            TileCache::in_memory(),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            renderer.render_with_cancellation(&moscow(900, 100), cancel),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[tokio::test]
    async fn test_render_timeout() {
        let config = RenderConfig {
            render_timeout: Some(Duration::from_millis(50)),
            ..RenderConfig::default()
        };
        let renderer = MapRenderer::new(
            Arc::new(MockProvider::slow(Duration::from_secs(30))),
            Arc::new(TileCache::in_memory()),
            config,
        );

        let result = renderer.render(&moscow(256, 256)).await;

        assert!(matches!(result, Err(RenderError::TimedOut(_))));
    }

    #[tokio::test]
    async fn test_fetches_respect_limit() {
        let config = RenderConfig {
            max_concurrent_fetches: 2,
            ..RenderConfig::default()
        };
        let renderer = MapRenderer::new(
            Arc::new(MockProvider::slow(Duration::from_millis(10))),
            Arc::new(TileCache::in_memory()),
            config,
        );

        renderer.render(&moscow(900, 512)).await.unwrap();

        assert!(renderer.limiter().peak_in_flight() <= 2);
        assert_eq!(renderer.limiter().in_flight(), 0);
    }
}
