//! Persistence for users, classified ads and photos.
//!
//! # Database: `free_ads`
//!
//! ## Tables
//!
//! - `users` - Marketplace users
//! - `classified_ads` - Listings, each owned by one user
//! - `photos` - Ad photos; a partial unique index allows one `is_main` row per ad
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p fa-cli -- migrate
//! ```
//!
//! # Stores
//!
//! [`ClassifiedAdsStore`] is the seam between the photo service and storage.
//! [`PgClassifiedAdsStore`] backs the running service; [`MemoryStore`] backs
//! tests and keeps the same commit semantics.

pub mod changes;
pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use free_ads_core::{ClassifiedAd, ClassifiedAdId, Photo, PhotoId, User, UserId};

pub use changes::{ChangeSet, SavedChanges};
pub use memory::MemoryStore;
pub use postgres::PgClassifiedAdsStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a second main photo for an ad).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage operations used by the photo service.
///
/// Reads return the committed state. Writes are staged in a [`ChangeSet`] and
/// applied by [`save_all`](Self::save_all) atomically: either every change is
/// written or none is.
#[async_trait]
pub trait ClassifiedAdsStore: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Look up a user by ID.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a photo by ID, regardless of the ad it belongs to.
    async fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, RepositoryError>;

    /// Load an ad together with all its photos.
    async fn get_classified_ad_detail(
        &self,
        id: ClassifiedAdId,
    ) -> Result<Option<ClassifiedAd>, RepositoryError>;

    /// The ad's current main photo.
    async fn get_main_photo_for_classified_ad(
        &self,
        id: ClassifiedAdId,
    ) -> Result<Option<Photo>, RepositoryError>;

    /// Commit staged changes in one transaction.
    ///
    /// Demotions are applied before deletions, insertions and promotions so a
    /// main-photo swap never has two main photos at any point.
    async fn save_all(&self, changes: ChangeSet) -> Result<SavedChanges, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
