//! Tile provider abstraction
//!
//! This module provides the traits and the implementation used to download
//! slippy-map tiles from a tile server.
//!
//! ```ignore
//! use maprender::provider::{AsyncReqwestClient, SlippyTileProvider};
//!
//! let http_client = AsyncReqwestClient::new()?;
//! let provider = SlippyTileProvider::new(http_client);
//! ```

mod http;
mod slippy;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use slippy::{
    SlippyProviderConfig, SlippyTileProvider, DEFAULT_BASE_URL, DEFAULT_EXTENSION,
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM,
};
pub use types::{AsyncProvider, ProviderError};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
