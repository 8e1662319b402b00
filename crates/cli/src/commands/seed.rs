//! Seed the database with a user and an ad for local development.
//!
//! Ads are created by a separate flow in production; this gives the photo
//! endpoints something to work on.

use sqlx::PgPool;
use tracing::info;

use free_ads_api::db;
use free_ads_core::{ClassifiedAdId, UserId};

/// Insert a user owning one classified ad.
///
/// An existing user with the same username is reused.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails.
pub async fn user_with_ad(
    username: &str,
    title: &str,
) -> Result<(UserId, ClassifiedAdId), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = super::database_url().ok_or("FREE_ADS_DATABASE_URL not set")?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let user_id = upsert_user(&pool, username).await?;
    let ad_id = insert_ad(&pool, user_id, title).await?;

    info!(%user_id, %ad_id, username, title, "Seeded user and classified ad");
    Ok((user_id, ad_id))
}

async fn upsert_user(pool: &PgPool, username: &str) -> Result<UserId, sqlx::Error> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO users (username, known_as)
        VALUES ($1, $1)
        ON CONFLICT (username) DO UPDATE SET last_active = now()
        RETURNING id
        ",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(UserId::new(id))
}

async fn insert_ad(pool: &PgPool, user_id: UserId, title: &str) -> Result<ClassifiedAdId, sqlx::Error> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO classified_ads (user_id, title)
        VALUES ($1, $2)
        RETURNING id
        ",
    )
    .bind(user_id.as_i32())
    .bind(title)
    .fetch_one(pool)
    .await?;

    Ok(ClassifiedAdId::new(id))
}
