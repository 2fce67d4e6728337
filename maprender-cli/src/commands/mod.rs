//! CLI command implementations.
//!
//! - [`cache`] - Cache inspection
//! - [`init`] - Configuration initialization
//! - [`render`] - Render a viewport to a PNG file

pub mod cache;
pub mod common;
pub mod init;
pub mod render;
