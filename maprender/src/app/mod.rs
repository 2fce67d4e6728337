//! Application bootstrap.
//!
//! [`MapRenderApp`] wires the pieces together in the order they depend on
//! each other:
//!
//! ```text
//! AppConfig ──► cache directory (created) ──► TileCache::open (disk → memory)
//!           ──► AsyncReqwestClient ──► SlippyTileProvider
//!           ──► MapRenderer(provider, cache, RenderConfig)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use maprender::app::{AppConfig, MapRenderApp};
//! use maprender::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = MapRenderApp::start(config).await?;
//! let output = app.renderer().render(&viewport).await?;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{MapRenderApp, SlippyRenderer};
pub use config::AppConfig;
pub use error::AppError;
