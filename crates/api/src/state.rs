//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::ClassifiedAdsStore;
use crate::image_host::ImageHost;
use crate::messages::Locale;
use crate::middleware::TokenValidator;
use crate::services::PhotoManager;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store and image host are trait objects so
/// tests can run the full router against in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn ClassifiedAdsStore>,
    photos: PhotoManager,
    tokens: TokenValidator,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn ClassifiedAdsStore>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        let photos = PhotoManager::new(Arc::clone(&store), images);
        let tokens = TokenValidator::new(&config.jwt_secret);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                photos,
                tokens,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Language used for error messages.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.inner.config.locale
    }

    #[must_use]
    pub fn store(&self) -> &dyn ClassifiedAdsStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn photos(&self) -> &PhotoManager {
        &self.inner.photos
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenValidator {
        &self.inner.tokens
    }
}
