//! CLI error handling with user-friendly messages.
//!
//! Every failure ends the process with exit code 1 after printing the error
//! and, where it helps, a hint.

use std::fmt;
use std::path::PathBuf;
use std::process;

use maprender::app::AppError;
use maprender::cache::CacheError;
use maprender::compositor::CompositorError;
use maprender::config::ConfigFileError;
use maprender::coord::CoordError;
use maprender::orchestrator::{RenderError, TileErrorKind};

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Config file could not be loaded or saved
    Config(ConfigFileError),
    /// Command-line values do not form a valid viewport
    Viewport(CoordError),
    /// Application failed to start
    Startup(AppError),
    /// The render failed
    Render(RenderError),
    /// The finished image could not be encoded
    Encode(CompositorError),
    /// Failed to write the output file
    FileWrite {
        path: PathBuf,
        error: std::io::Error,
    },
    /// The cache directory could not be read
    Cache(CacheError),
    /// The Tokio runtime or signal handler could not be set up
    Runtime(String),
}

impl CliError {
    /// Prints the error and exits with code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Render(RenderError::Tile {
                kind: TileErrorKind::Fetch(_),
                ..
            }) => {
                eprintln!();
                eprintln!("The tile server refused or failed a request. Check that:");
                eprintln!("  1. base_url in config.ini points at a working tile server");
                eprintln!("  2. user_agent identifies your application (anonymous clients get HTTP 403)");
                eprintln!("  3. the requested zoom is served by that server");
            }
            CliError::Render(RenderError::Tile {
                kind: TileErrorKind::Composition(_),
                key,
            }) => {
                eprintln!();
                eprintln!(
                    "The cached file {} may be corrupt; delete it to fetch it again.",
                    key
                );
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Viewport(e) => write!(f, "Invalid viewport: {}", e),
            CliError::Startup(e) => write!(f, "{}", e),
            CliError::Render(e) => write!(f, "Render failed: {}", e),
            CliError::Encode(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
            CliError::Cache(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Viewport(e) => Some(e),
            CliError::Startup(e) => Some(e),
            CliError::Render(e) => Some(e),
            CliError::Encode(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Cache(e) => Some(e),
            CliError::Runtime(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Viewport(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Startup(e)
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::Render(e)
    }
}

impl From<CompositorError> for CliError {
    fn from(e: CompositorError) -> Self {
        CliError::Encode(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_write_display() {
        let err = CliError::FileWrite {
            path: PathBuf::from("/read-only/map.png"),
            error: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to write file '/read-only/map.png': denied"
        );
    }

    #[test]
    fn test_from_coord_error() {
        let err: CliError = CoordError::InvalidZoom(30).into();
        assert!(matches!(err, CliError::Viewport(_)));
        assert!(err.to_string().starts_with("Invalid viewport"));
    }
}
