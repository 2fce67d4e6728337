//! Application bootstrap implementation.

use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::cache::{CacheStats, TileCache};
use crate::orchestrator::MapRenderer;
use crate::provider::{AsyncReqwestClient, SlippyTileProvider};

/// Renderer backed by the real HTTP provider.
pub type SlippyRenderer = MapRenderer<SlippyTileProvider<AsyncReqwestClient>>;

/// A started application: cache loaded, provider ready.
pub struct MapRenderApp {
    renderer: SlippyRenderer,
    config: AppConfig,
}

impl MapRenderApp {
    /// Starts the application.
    ///
    /// Creates the cache directory if needed and loads every tile in it on
    /// the blocking pool before returning.
    ///
    /// # Errors
    ///
    /// Fails if the cache directory cannot be created or listed, or if the
    /// HTTP client cannot be built.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let cache = Arc::new(Self::open_cache(&config).await?);

        let http_client =
            AsyncReqwestClient::with_settings(&config.user_agent, config.http_timeout_secs)?;
        let provider = Arc::new(SlippyTileProvider::with_config(
            http_client,
            config.provider.clone(),
        ));

        info!(
            provider = %config.provider.base_url,
            cache_dir = %config.cache_dir.display(),
            max_concurrent_fetches = config.render.max_concurrent_fetches,
            coalesce = config.render.coalesce_fetches,
            "Application started"
        );

        let renderer = MapRenderer::new(provider, cache, config.render.clone());
        Ok(Self { renderer, config })
    }

    /// Creates the cache directory and loads it.
    async fn open_cache(config: &AppConfig) -> Result<TileCache, AppError> {
        let dir = config.cache_dir.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir).map_err(|source| AppError::CacheDirectory {
                path: dir.clone(),
                source,
            })?;
            TileCache::open(&dir).map_err(AppError::from)
        })
        .await
        .map_err(|e| AppError::TaskFailed(e.to_string()))?
    }

    pub fn renderer(&self) -> &SlippyRenderer {
        &self.renderer
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.renderer.cache().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AsyncProvider;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_start_creates_and_loads_cache_dir() {
        let temp = TempDir::new().unwrap();
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache_dir.join("1_2_3.png"), b"x").unwrap();

        let app = MapRenderApp::start(AppConfig::default().with_cache_dir(cache_dir.clone()))
            .await
            .unwrap();

        assert_eq!(app.cache_stats().entries, 1);
        assert_eq!(app.renderer().cache().directory(), Some(cache_dir.as_path()));
        assert_eq!(app.renderer().provider().max_zoom(), 19);
    }

    #[tokio::test]
    async fn test_start_creates_missing_cache_dir() {
        let temp = TempDir::new().unwrap();
        let cache_dir = temp.path().join("a").join("b");

        let app = MapRenderApp::start(AppConfig::default().with_cache_dir(cache_dir.clone()))
            .await
            .unwrap();

        assert!(cache_dir.is_dir());
        assert_eq!(app.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn test_start_fails_when_cache_dir_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();

        let result = MapRenderApp::start(AppConfig::default().with_cache_dir(file)).await;

        assert!(matches!(result, Err(AppError::CacheDirectory { .. })));
    }
}
