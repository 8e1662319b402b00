//! `PostgreSQL` implementation of [`ClassifiedAdsStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use free_ads_core::{ClassifiedAd, ClassifiedAdId, NewPhoto, Photo, PhotoId, User, UserId};

use super::{ChangeSet, ClassifiedAdsStore, RepositoryError, SavedChanges};

const PHOTO_COLUMNS: &str = "id, classified_ad_id, url, description, date_added, public_id, is_main";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PhotoRow {
    id: i32,
    classified_ad_id: i32,
    url: String,
    description: Option<String>,
    date_added: DateTime<Utc>,
    public_id: Option<String>,
    is_main: bool,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: PhotoId::new(row.id),
            classified_ad_id: ClassifiedAdId::new(row.classified_ad_id),
            url: row.url,
            description: row.description,
            date_added: row.date_added,
            public_id: row.public_id,
            is_main: row.is_main,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClassifiedAdRow {
    id: i32,
    user_id: i32,
    title: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    known_as: Option<String>,
    city: Option<String>,
    phone_number: Option<String>,
    created: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            known_as: row.known_as,
            city: row.city,
            phone_number: row.phone_number,
            created: row.created,
            last_active: row.last_active,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store backed by the `free_ads` database.
#[derive(Debug, Clone)]
pub struct PgClassifiedAdsStore {
    pool: PgPool,
}

impl PgClassifiedAdsStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn set_main_flag(
        tx: &mut Transaction<'_, Postgres>,
        photo_id: PhotoId,
        is_main: bool,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE photos SET is_main = $2 WHERE id = $1")
            .bind(photo_id)
            .bind(is_main)
            .execute(&mut **tx)
            .await
            .map_err(map_constraint_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(result.rows_affected())
    }

    async fn insert_photo(
        tx: &mut Transaction<'_, Postgres>,
        photo: &NewPhoto,
    ) -> Result<Photo, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            r"
            INSERT INTO photos (classified_ad_id, url, description, date_added, public_id, is_main)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PHOTO_COLUMNS}
            "
        ))
        .bind(photo.classified_ad_id)
        .bind(&photo.url)
        .bind(photo.description.as_deref())
        .bind(photo.date_added)
        .bind(photo.public_id.as_deref())
        .bind(photo.is_main)
        .fetch_one(&mut **tx)
        .await
        .map_err(map_constraint_error)?;

        Ok(row.into())
    }
}

/// Map unique and foreign-key violations to `Conflict`.
fn map_constraint_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict("ad already has a main photo".to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict("classified ad does not exist".to_owned());
        }
    }
    RepositoryError::Database(e)
}

#[async_trait]
impl ClassifiedAdsStore for PgClassifiedAdsStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, known_as, city, phone_number, created, last_active
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    #[instrument(skip(self))]
    async fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Photo::from))
    }

    #[instrument(skip(self))]
    async fn get_classified_ad_detail(
        &self,
        id: ClassifiedAdId,
    ) -> Result<Option<ClassifiedAd>, RepositoryError> {
        let Some(ad) = sqlx::query_as::<_, ClassifiedAdRow>(
            "SELECT id, user_id, title FROM classified_ads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let photos = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE classified_ad_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ClassifiedAd {
            id: ClassifiedAdId::new(ad.id),
            user_id: UserId::new(ad.user_id),
            title: ad.title,
            photos: photos.into_iter().map(Photo::from).collect(),
        }))
    }

    #[instrument(skip(self))]
    async fn get_main_photo_for_classified_ad(
        &self,
        id: ClassifiedAdId,
    ) -> Result<Option<Photo>, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE classified_ad_id = $1 AND is_main"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Photo::from))
    }

    #[instrument(skip(self, changes))]
    async fn save_all(&self, changes: ChangeSet) -> Result<SavedChanges, RepositoryError> {
        if changes.is_empty() {
            return Ok(SavedChanges::default());
        }

        let mut tx = self.pool.begin().await?;
        let mut saved = SavedChanges::default();

        for photo_id in changes.demotions() {
            saved.rows_affected += Self::set_main_flag(&mut tx, photo_id, false).await?;
        }

        for photo_id in changes.deleted() {
            let result = sqlx::query("DELETE FROM photos WHERE id = $1")
                .bind(*photo_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
            saved.rows_affected += result.rows_affected();
        }

        for photo in changes.added() {
            saved.inserted.push(Self::insert_photo(&mut tx, photo).await?);
            saved.rows_affected += 1;
        }

        for photo_id in changes.promotions() {
            saved.rows_affected += Self::set_main_flag(&mut tx, photo_id, true).await?;
        }

        // Dropping `tx` on any early return above rolls everything back
        tx.commit().await?;

        debug!(rows = saved.rows_affected, "Photo changes committed");
        Ok(saved)
    }
}
