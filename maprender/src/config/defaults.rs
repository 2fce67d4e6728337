//! Default configuration values.

use std::path::PathBuf;

pub use crate::orchestrator::DEFAULT_RENDER_TIMEOUT_SECS;
pub use crate::pipeline::DEFAULT_MAX_CONCURRENT_FETCHES;
pub use crate::provider::{
    DEFAULT_BASE_URL, DEFAULT_EXTENSION, DEFAULT_MAX_ZOOM, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};

/// Name of the directory under `$HOME` holding config and cache.
pub const CONFIG_DIR_NAME: &str = ".maprender";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default cache directory: `~/.maprender/cache`.
pub fn default_cache_dir() -> PathBuf {
    super::config_directory().join("cache")
}
