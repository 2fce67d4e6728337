//! Provider types and traits

use std::fmt;
use std::future::Future;

use bytes::Bytes;

use crate::coord::TileCoord;

/// Errors that can occur while fetching a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Request failed or returned a non-success status
    HttpError(String),
    /// Zoom level not supported by this provider
    UnsupportedZoom(u8),
    /// Response body is empty or not a recognisable image
    InvalidResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::UnsupportedZoom(zoom) => {
                write!(f, "Zoom level {} not supported by provider", zoom)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Async source of slippy-map tiles.
///
/// A provider performs exactly one request per call and never retries. It
/// returns the encoded tile as served; decoding happens in the compositor.
pub trait AsyncProvider: Send + Sync {
    /// Fetches the encoded image for `tile`.
    fn fetch_tile(&self, tile: TileCoord)
        -> impl Future<Output = Result<Bytes, ProviderError>> + Send;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// File extension of the provider's native tile format (without dot).
    fn extension(&self) -> &str;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Checks if this provider supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ProviderError::HttpError("HTTP 403".to_string()).to_string(),
            "HTTP error: HTTP 403"
        );
        assert_eq!(
            ProviderError::UnsupportedZoom(25).to_string(),
            "Zoom level 25 not supported by provider"
        );
        assert!(ProviderError::InvalidResponse("empty body".to_string())
            .to_string()
            .contains("empty body"));
    }
}
