//! Application configuration for `MapRenderApp`.
//!
//! `AppConfig` is the resolved view of the config file plus any command-line
//! overrides, expressed in the types the library components take.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::orchestrator::RenderConfig;
use crate::provider::SlippyProviderConfig;

/// Everything needed to start a [`MapRenderApp`](super::MapRenderApp).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding cached tile files
    pub cache_dir: PathBuf,

    /// Tile server settings
    pub provider: SlippyProviderConfig,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub http_timeout_secs: u64,

    pub render: RenderConfig,
}

impl AppConfig {
    /// Builds the application config from a loaded config file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let render_timeout =
            (config.render.timeout > 0).then(|| Duration::from_secs(config.render.timeout));

        Self {
            cache_dir: config.cache.directory.clone(),
            provider: SlippyProviderConfig {
                base_url: config.provider.base_url.clone(),
                extension: config.provider.extension.clone(),
                max_zoom: config.provider.max_zoom,
                ..SlippyProviderConfig::default()
            },
            user_agent: config.provider.user_agent.clone(),
            http_timeout_secs: config.provider.timeout,
            render: RenderConfig {
                max_concurrent_fetches: config.render.max_concurrent_fetches,
                coalesce_fetches: config.render.coalesce_fetches,
                render_timeout,
            },
        }
    }

    /// Sets the cache directory.
    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = dir;
        self
    }

    /// Sets the fetch concurrency limit.
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.render.max_concurrent_fetches = max;
        self
    }

    /// Enables or disables fetch coalescing.
    pub fn with_coalesce_fetches(mut self, enabled: bool) -> Self {
        self.render.coalesce_fetches = enabled;
        self
    }

    /// Sets the render timeout; `None` disables it.
    pub fn with_render_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.render.render_timeout = timeout;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}
