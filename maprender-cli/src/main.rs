//! maprender CLI - Command-line interface
//!
//! Renders map images from slippy-map tiles and manages the tile cache and
//! configuration file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::render::RenderArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "maprender", version)]
#[command(about = "Render map images of any size from slippy-map tiles", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.maprender/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render a viewport to a PNG file
    Render(RenderArgs),

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Inspect the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _logging = maprender::logging::init_logging(cli.log_file.as_deref())
        .map_err(CliError::LoggingInit)?;

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Render(args) => commands::render::run(args, config),
        Commands::Init { force } => commands::init::run(config, force),
        Commands::Cache { action } => commands::cache::run(action, config),
    }
}
