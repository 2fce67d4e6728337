//! Cache inspection commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use maprender::cache::TileCache;

use super::common::load_config;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Load the cache directory and show how many tiles it holds
    Stats {
        /// Cache directory (defaults to the config file's [cache] directory)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Runs a cache subcommand.
pub fn run(action: CacheAction, config: Option<&Path>) -> Result<(), CliError> {
    match action {
        CacheAction::Stats { cache_dir } => {
            let dir = match cache_dir {
                Some(dir) => dir,
                None => load_config(config)?.cache.directory,
            };

            println!("Tile cache: {}", dir.display());
            if !dir.is_dir() {
                println!("  (directory does not exist yet)");
                return Ok(());
            }

            let stats = TileCache::open(&dir)?.stats();
            println!("  Tiles: {}", stats.entries);
            println!("  Size:  {}", format_bytes(stats.size_bytes));
            Ok(())
        }
    }
}

/// Formats a byte count with a binary unit.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
