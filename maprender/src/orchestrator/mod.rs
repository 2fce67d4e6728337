//! Render orchestration
//!
//! Turns a [`Viewport`](crate::coord::Viewport) into an image: one task per
//! grid cell resolves its tile through the cache or the provider and blits it
//! onto a shared canvas. The render ends when every task has finished or the
//! first one fails.

mod renderer;
mod types;

pub use renderer::MapRenderer;
pub use types::{
    RenderConfig, RenderError, RenderOutput, TileErrorKind, DEFAULT_RENDER_TIMEOUT_SECS,
};
