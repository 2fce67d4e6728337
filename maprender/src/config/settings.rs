//! Configuration structs for each INI section.

use std::path::PathBuf;

use super::defaults::*;

/// Complete contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub render: RenderSettings,
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Tile server root, e.g. `https://tile.openstreetmap.org`
    pub base_url: String,
    /// Tile file extension without dot
    pub extension: String,
    /// Sent with every request
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Highest zoom the server provides
    pub max_zoom: u8,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
        }
    }
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub max_concurrent_fetches: usize,
    pub coalesce_fetches: bool,
    /// Render timeout in seconds; 0 disables it
    pub timeout: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            coalesce_fetches: true,
            timeout: DEFAULT_RENDER_TIMEOUT_SECS,
        }
    }
}
