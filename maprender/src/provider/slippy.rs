//! Standard slippy-map tile provider.
//!
//! # URL Pattern
//!
//! `{base_url}/{z}/{x}/{y}.{ext}`, e.g.
//! `https://tile.openstreetmap.org/17/79233/40961.png`
//!
//! - X: Column (0 to 2^zoom - 1, west to east)
//! - Y: Row (0 to 2^zoom - 1, north to south)
//! - Z: Zoom level
//!
//! The provider identifies itself through the HTTP client's User-Agent; tile
//! servers such as the OpenStreetMap foundation's answer 403 to clients that
//! don't.

use bytes::Bytes;
use tracing::debug;

use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, AsyncProvider, ProviderError};

/// Default tile server.
pub const DEFAULT_BASE_URL: &str = "https://tile.openstreetmap.org";

/// Default tile file extension.
pub const DEFAULT_EXTENSION: &str = "png";

/// Minimum zoom level served by standard slippy-map servers.
pub const DEFAULT_MIN_ZOOM: u8 = 0;

/// Maximum zoom level served by tile.openstreetmap.org.
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Settings for a [`SlippyTileProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlippyProviderConfig {
    /// Scheme and host (plus optional path prefix), without trailing slash
    pub base_url: String,
    /// Tile file extension, without dot
    pub extension: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for SlippyProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

/// Fetches tiles from a `{z}/{x}/{y}.{ext}` tile server.
///
/// # Example
///
/// ```ignore
/// use maprender::provider::{AsyncReqwestClient, SlippyTileProvider};
///
/// let client = AsyncReqwestClient::new()?;
/// let provider = SlippyTileProvider::new(client);
/// let bytes = provider.fetch_tile(TileCoord { x: 0, y: 0, zoom: 0 }).await?;
/// ```
pub struct SlippyTileProvider<C: AsyncHttpClient> {
    http_client: C,
    config: SlippyProviderConfig,
}

impl<C: AsyncHttpClient> SlippyTileProvider<C> {
    /// Creates a provider for the default OpenStreetMap tile server.
    pub fn new(http_client: C) -> Self {
        Self::with_config(http_client, SlippyProviderConfig::default())
    }

    /// Creates a provider with custom server settings.
    pub fn with_config(http_client: C, mut config: SlippyProviderConfig) -> Self {
        while config.base_url.ends_with('/') {
            config.base_url.pop();
        }
        Self {
            http_client,
            config,
        }
    }

    /// Returns the provider settings.
    pub fn config(&self) -> &SlippyProviderConfig {
        &self.config
    }

    /// Builds the tile URL for the given coordinates.
    fn build_url(&self, tile: &TileCoord) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            self.config.base_url, tile.zoom, tile.x, tile.y, self.config.extension
        )
    }
}

impl<C: AsyncHttpClient> AsyncProvider for SlippyTileProvider<C> {
    async fn fetch_tile(&self, tile: TileCoord) -> Result<Bytes, ProviderError> {
        if !self.supports_zoom(tile.zoom) {
            return Err(ProviderError::UnsupportedZoom(tile.zoom));
        }

        let url = self.build_url(&tile);
        let body = self.http_client.get(&url).await?;
        validate_body(&url, &body)?;

        debug!(url = %url, bytes = body.len(), "Fetched tile");
        Ok(body)
    }

    fn name(&self) -> &str {
        &self.config.base_url
    }

    fn extension(&self) -> &str {
        &self.config.extension
    }

    fn min_zoom(&self) -> u8 {
        self.config.min_zoom
    }

    fn max_zoom(&self) -> u8 {
        self.config.max_zoom
    }
}

/// Rejects bodies that cannot possibly be a tile image.
///
/// Only the signature is checked; full decoding is the compositor's job.
fn validate_body(url: &str, body: &[u8]) -> Result<(), ProviderError> {
    if body.is_empty() {
        return Err(ProviderError::InvalidResponse(format!(
            "empty body from {}",
            url
        )));
    }
    image::guess_format(body).map_err(|_| {
        ProviderError::InvalidResponse(format!("body from {} is not a known image format", url))
    })?;
    Ok(())
}
