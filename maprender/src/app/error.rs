//! Application error types.

use std::fmt;
use std::path::PathBuf;

use crate::cache::CacheError;
use crate::config::ConfigFileError;
use crate::provider::ProviderError;

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// The configuration file could not be loaded.
    Config(ConfigFileError),

    /// The cache directory could not be created.
    CacheDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The cache directory could not be loaded.
    CacheLoad(CacheError),

    /// The HTTP client could not be built.
    HttpClient(ProviderError),

    /// A startup task panicked.
    TaskFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::CacheDirectory { path, source } => {
                write!(
                    f,
                    "Failed to create cache directory {}: {}",
                    path.display(),
                    source
                )
            }
            AppError::CacheLoad(e) => write!(f, "Failed to load tile cache: {}", e),
            AppError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            AppError::TaskFailed(msg) => write!(f, "Startup task failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::CacheDirectory { source, .. } => Some(source),
            AppError::CacheLoad(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
            AppError::TaskFailed(_) => None,
        }
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e)
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::CacheLoad(e)
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::HttpClient(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::CacheDirectory {
            path: PathBuf::from("/nope/cache"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/nope/cache"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_app_error_from_provider_error() {
        let app_err: AppError = ProviderError::HttpError("bad TLS".to_string()).into();
        assert!(matches!(app_err, AppError::HttpClient(_)));
        assert!(app_err.to_string().contains("bad TLS"));
    }
}
