//! Render command - render one viewport to a PNG file.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use maprender::app::{AppConfig, MapRenderApp};
use maprender::coord::{GeoPoint, Viewport};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::common::load_config;
use crate::error::CliError;

/// Arguments for `maprender render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Latitude of the image center in decimal degrees
    #[arg(long, default_value_t = 55.755821, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the image center in decimal degrees
    #[arg(long, default_value_t = 37.617635, allow_hyphen_values = true)]
    pub lon: f64,

    /// Zoom level (0-19 for OpenStreetMap)
    #[arg(long, default_value_t = 17)]
    pub zoom: u8,

    /// Image width in pixels
    #[arg(long, default_value_t = 900)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 100)]
    pub height: u32,

    /// Output PNG path
    #[arg(long, short, default_value = "map.png")]
    pub output: PathBuf,

    /// Tile cache directory (overrides config file)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Maximum concurrent tile requests (overrides config file)
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Fetch duplicate tiles separately instead of sharing one request
    #[arg(long)]
    pub no_coalesce: bool,

    /// Render timeout in seconds, 0 for none (overrides config file)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl RenderArgs {
    /// Builds the validated viewport.
    pub fn viewport(&self) -> Result<Viewport, CliError> {
        Ok(Viewport::new(
            GeoPoint::new(self.lon, self.lat),
            self.zoom,
            self.width,
            self.height,
        )?)
    }

    /// Applies command-line overrides to the config-file settings.
    pub fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(dir) = &self.cache_dir {
            config = config.with_cache_dir(dir.clone());
        }
        if let Some(max) = self.max_concurrent {
            config = config.with_max_concurrent_fetches(max);
        }
        if self.no_coalesce {
            config = config.with_coalesce_fetches(false);
        }
        if let Some(secs) = self.timeout {
            config = config.with_render_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        config
    }
}

/// Runs the render command.
pub fn run(args: RenderArgs, config: Option<&std::path::Path>) -> Result<(), CliError> {
    let viewport = args.viewport()?;
    let app_config = args.apply_overrides(AppConfig::from_config_file(&load_config(config)?));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, cancelling render...");
        on_interrupt.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("failed to install Ctrl+C handler: {}", e)))?;

    runtime.block_on(async {
        let app = MapRenderApp::start(app_config).await?;

        let started = Instant::now();
        let output = app
            .renderer()
            .render_with_cancellation(&viewport, cancel)
            .await?;
        let elapsed = started.elapsed();

        let png = output.encode_png()?;
        tokio::fs::write(&args.output, &png)
            .await
            .map_err(|error| CliError::FileWrite {
                path: args.output.clone(),
                error,
            })?;

        info!(path = %args.output.display(), bytes = png.len(), "Wrote image");

        println!(
            "Rendered {}x{} at ({}, {}) zoom {} in {:.3}s",
            viewport.width(),
            viewport.height(),
            args.lat,
            args.lon,
            viewport.zoom(),
            elapsed.as_secs_f64()
        );
        println!(
            "Tiles: {} ({} from cache, {:.0}% hit rate, {} network fetches)",
            output.stats.tiles_total,
            output.stats.cache_hits,
            output.stats.cache_hit_rate() * 100.0,
            output.stats.network_fetches
        );
        println!("Saved: {}", args.output.display());
        Ok::<(), CliError>(())
    })
}
