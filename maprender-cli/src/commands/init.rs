//! Init command - write a default configuration file.

use std::path::Path;

use maprender::config::ConfigFile;

use super::common::config_path;
use crate::error::CliError;

/// Runs the init command.
///
/// An existing file is left alone unless `force` is set.
pub fn run(config: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = config_path(config);

    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to choose the tile server and cache directory.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
