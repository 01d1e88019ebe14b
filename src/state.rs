//! Application state management.
//!
//! This module defines the shared application state that is accessible
//! from all request handlers via Axum's State extractor.
//!
//! # Usage
//!
//! ```rust,ignore
//! async fn handler(State(state): State<AppState>) -> impl IntoResponse {
//!     let toilet = state.toilets.get(id)?;
//!     // ...
//! }
//! ```

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    CommentService, DatabaseService, ImageInspector, ImageService, RatingService,
    StorageService, ToiletService, UserService,
};
use std::sync::Arc;

/// Shared application state
///
/// Services are cheap to clone: they share the database and blob store
/// through `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Document store, used directly by health and stats endpoints
    pub db: Arc<DatabaseService>,

    /// Blob store for image content
    pub storage: Arc<StorageService>,

    pub toilets: ToiletService,
    pub comments: CommentService,
    pub ratings: RatingService,
    pub images: ImageService,
    pub users: UserService,
}

impl AppState {
    /// Create a new application state
    ///
    /// # Errors
    /// Returns error if the database or blob store cannot be opened
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DatabaseService::new(&config.storage)?);
        let storage = Arc::new(StorageService::new(&config.storage).await?);
        let base_url = config.server.base_url.as_str();

        let toilets = ToiletService::new(
            Arc::clone(&db),
            Arc::clone(&storage),
            &config.toilets,
            base_url,
        );
        let comments = CommentService::new(Arc::clone(&db), config.comments.max_length);
        let ratings = RatingService::new(Arc::clone(&db));
        let images = ImageService::new(
            Arc::clone(&db),
            Arc::clone(&storage),
            ImageInspector::new(&config.images),
        );
        let users = UserService::new(Arc::clone(&db));

        Ok(Self {
            config: Arc::new(config),
            db,
            storage,
            toilets,
            comments,
            ratings,
            images,
            users,
        })
    }

    /// Get the base URL for image URLs
    pub fn base_url(&self) -> &str {
        &self.config.server.base_url
    }

    /// Get cache max age in seconds
    pub fn cache_max_age(&self) -> u64 {
        self.config.images.cache_max_age
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("db", &self.db)
            .field("storage", &self.storage)
            .finish()
    }
}
