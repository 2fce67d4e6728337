//! maprender - Slippy-map viewport renderer
//!
//! Renders a rectangular map image of any size centred on a geographic point
//! by assembling 256×256 Web Mercator tiles fetched from a tile server,
//! keeping every tile it fetches in a two-tier (memory + directory) cache.
//!
//! # Modules
//!
//! - [`coord`]: geographic ↔ tile math and viewport grids
//! - [`cache`]: memory tier over a directory of tile files
//! - [`provider`]: HTTP tile fetching
//! - [`pipeline`]: fetch concurrency limiting and coalescing
//! - [`compositor`]: decoding tiles onto the output canvas
//! - [`orchestrator`]: one render, end to end
//! - [`telemetry`]: per-render counters
//! - [`config`], [`app`], [`logging`]: configuration file, bootstrap, tracing

pub mod app;
pub mod cache;
pub mod compositor;
pub mod config;
pub mod coord;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;
pub mod provider;
pub mod telemetry;

pub use coord::{GeoPoint, Viewport};
pub use orchestrator::{MapRenderer, RenderConfig, RenderError, RenderOutput};
