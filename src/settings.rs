//! API settings
//!
//! The storefront talks to a backend whose base URL can be overridden at
//! runtime from the admin settings screen. The override is kept in the same
//! key-value storage as the cart.

use std::{env, sync::Arc};

use reqwest::Url;
use thiserror::Error;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the overridden base URL.
pub const API_URL_KEY: &str = "api_server_url";

/// Environment variable providing the default base URL.
pub const BACKEND_URL_ENV: &str = "RANGE_CART_BACKEND_URL";

/// Base URL used when neither the environment nor storage provide one.
pub const FALLBACK_API_URL: &str = "http://localhost:8001";

/// Errors raised while changing the API settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The URL could not be parsed or is not http(s).
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected input.
        url: String,

        /// Why it was rejected.
        reason: String,
    },

    /// The override could not be stored.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Default base URL: [`BACKEND_URL_ENV`] if set, else [`FALLBACK_API_URL`].
pub fn default_api_url() -> String {
    env::var(BACKEND_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_API_URL.to_string())
}

/// Runtime API base URL with a persisted override.
#[derive(Clone)]
pub struct ApiConfig {
    storage: Arc<dyn KeyValueStore>,
    default_url: String,
    current_url: String,
    initialized: bool,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("default_url", &self.default_url)
            .field("current_url", &self.current_url)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    /// Create a config that starts out using `default_url`.
    pub fn new(storage: Arc<dyn KeyValueStore>, default_url: impl Into<String>) -> Self {
        let default_url = default_url.into();

        Self {
            storage,
            current_url: default_url.clone(),
            default_url,
            initialized: false,
        }
    }

    /// Load the stored override, once.
    ///
    /// A storage failure keeps the default URL; it is logged, not returned.
    pub async fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        match self.storage.get(API_URL_KEY).await {
            Ok(Some(url)) if !url.is_empty() => self.current_url = url,
            Ok(_) => {}
            Err(error) => {
                warn!(error = %error, "failed to load API URL, using default");
                self.current_url.clone_from(&self.default_url);
            }
        }

        self.initialized = true;
    }

    /// Persist `url` as the override and switch to it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the URL is invalid or cannot be stored;
    /// the current URL is unchanged in that case.
    pub async fn set_api_url(&mut self, url: &str) -> Result<(), ConfigError> {
        let url = validate_url(url)?;

        self.storage
            .set(API_URL_KEY, url.clone())
            .await
            .inspect_err(|error| warn!(error = %error, "failed to save API URL"))?;

        info!(%url, "API URL updated");
        self.current_url = url;

        Ok(())
    }

    /// Drop the override and return to the default URL.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the override cannot be removed.
    pub async fn reset(&mut self) -> Result<(), ConfigError> {
        self.storage.remove(API_URL_KEY).await?;
        self.current_url.clone_from(&self.default_url);

        Ok(())
    }

    /// Current base URL.
    pub fn api_url(&self) -> &str {
        &self.current_url
    }

    /// Base URL used without an override.
    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    /// Whether [`ApiConfig::initialize`] has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

fn validate_url(input: &str) -> Result<String, ConfigError> {
    let trimmed = input.trim().trim_end_matches('/');

    let parsed = Url::parse(trimmed).map_err(|error| ConfigError::InvalidUrl {
        url: input.to_string(),
        reason: error.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: input.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::storage::{MemoryStore, MockKeyValueStore};

    use super::*;

    const DEFAULT: &str = "http://localhost:8001";

    #[tokio::test]
    async fn initialize_loads_saved_override() {
        let storage = MemoryStore::with_entries([(API_URL_KEY, "https://range.example")]);
        let mut config = ApiConfig::new(Arc::new(storage), DEFAULT);

        assert_eq!(config.api_url(), DEFAULT);

        config.initialize().await;

        assert!(config.is_initialized());
        assert_eq!(config.api_url(), "https://range.example");
        assert_eq!(config.default_url(), DEFAULT);
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let mut storage = MockKeyValueStore::new();
        storage.expect_get().times(1).returning(|_| Ok(None));

        let mut config = ApiConfig::new(Arc::new(storage), DEFAULT);
        config.initialize().await;
        config.initialize().await;

        assert_eq!(config.api_url(), DEFAULT);
    }

    #[tokio::test]
    async fn initialize_falls_back_on_read_failure() {
        let mut storage = MockKeyValueStore::new();
        storage
            .expect_get()
            .returning(|_| Err(StorageError::Backend("unavailable".to_string())));

        let mut config = ApiConfig::new(Arc::new(storage), DEFAULT);
        config.initialize().await;

        assert!(config.is_initialized());
        assert_eq!(config.api_url(), DEFAULT);
    }

    #[tokio::test]
    async fn set_api_url_persists_and_switches() -> TestResult {
        let storage = MemoryStore::new();
        let mut config = ApiConfig::new(Arc::new(storage.clone()), DEFAULT);

        config.set_api_url(" https://range.example/ ").await?;

        assert_eq!(config.api_url(), "https://range.example");
        assert_eq!(
            storage.get(API_URL_KEY).await?.as_deref(),
            Some("https://range.example")
        );

        Ok(())
    }

    #[tokio::test]
    async fn set_api_url_failure_keeps_current() {
        let mut storage = MockKeyValueStore::new();
        storage
            .expect_set()
            .returning(|_, _| Err(StorageError::Backend("read-only".to_string())));

        let mut config = ApiConfig::new(Arc::new(storage), DEFAULT);
        let result = config.set_api_url("https://range.example").await;

        assert!(matches!(result, Err(ConfigError::Storage(_))));
        assert_eq!(config.api_url(), DEFAULT);
    }

    #[tokio::test]
    async fn invalid_urls_are_rejected() {
        let mut config = ApiConfig::new(Arc::new(MemoryStore::new()), DEFAULT);

        assert!(matches!(
            config.set_api_url("not a url").await,
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            config.set_api_url("ftp://range.example").await,
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert_eq!(config.api_url(), DEFAULT);
    }

    #[tokio::test]
    async fn reset_restores_default() -> TestResult {
        let storage = MemoryStore::new();
        let mut config = ApiConfig::new(Arc::new(storage.clone()), DEFAULT);

        config.set_api_url("https://range.example").await?;
        config.reset().await?;

        assert_eq!(config.api_url(), DEFAULT);
        assert_eq!(storage.get(API_URL_KEY).await?, None);

        Ok(())
    }
}
