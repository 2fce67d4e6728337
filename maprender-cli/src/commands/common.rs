//! Helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use maprender::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Resolves `--config`, falling back to `~/.maprender/config.ini`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

/// Loads the config file; a missing file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_from(&config_path(explicit))?)
}
