//! In-memory [`ClassifiedAdsStore`] used by tests.
//!
//! Commits are all-or-nothing and enforce the same one-main-photo constraint
//! as the database's partial unique index.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use free_ads_core::{ClassifiedAd, ClassifiedAdId, Photo, PhotoId, User, UserId};

use super::{ChangeSet, ClassifiedAdsStore, RepositoryError, SavedChanges};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    ads: BTreeMap<ClassifiedAdId, (UserId, String)>,
    photos: BTreeMap<PhotoId, Photo>,
    next_user_id: i32,
    next_ad_id: i32,
    next_photo_id: i32,
}

impl Tables {
    fn photos_of(&self, ad_id: ClassifiedAdId) -> impl Iterator<Item = &Photo> {
        self.photos
            .values()
            .filter(move |p| p.classified_ad_id == ad_id)
    }

    fn check_one_main_per_ad(&self) -> Result<(), RepositoryError> {
        for ad_id in self.ads.keys() {
            if self.photos_of(*ad_id).filter(|p| p.is_main).count() > 1 {
                return Err(RepositoryError::Conflict(
                    "ad already has a main photo".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

/// Store keeping everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_commits: AtomicBool,
    commits: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::DataCorruption("store lock poisoned".to_owned()))
    }

    /// Insert a user and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the username is taken.
    pub fn insert_user(&self, username: &str) -> Result<UserId, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.username == username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }
        tables.next_user_id += 1;
        let id = UserId::new(tables.next_user_id);
        let now = Utc::now();
        tables.users.insert(
            id,
            User {
                id,
                username: username.to_owned(),
                known_as: None,
                city: None,
                phone_number: None,
                created: now,
                last_active: now,
            },
        );
        Ok(id)
    }

    /// Insert an ad owned by `user_id` and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub fn insert_classified_ad(
        &self,
        user_id: UserId,
        title: &str,
    ) -> Result<ClassifiedAdId, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.next_ad_id += 1;
        let id = ClassifiedAdId::new(tables.next_ad_id);
        tables.ads.insert(id, (user_id, title.to_owned()));
        Ok(id)
    }

    /// Make every following commit fail with a database error until reset.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of commits that wrote at least one change.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifiedAdsStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.tables().map(|_| ())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn get_photo(&self, id: PhotoId) -> Result<Option<Photo>, RepositoryError> {
        Ok(self.tables()?.photos.get(&id).cloned())
    }

    async fn get_classified_ad_detail(
        &self,
        id: ClassifiedAdId,
    ) -> Result<Option<ClassifiedAd>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.ads.get(&id).map(|(user_id, title)| ClassifiedAd {
            id,
            user_id: *user_id,
            title: title.clone(),
            photos: tables.photos_of(id).cloned().collect(),
        }))
    }

    async fn get_main_photo_for_classified_ad(
        &self,
        id: ClassifiedAdId,
    ) -> Result<Option<Photo>, RepositoryError> {
        Ok(self.tables()?.photos_of(id).find(|p| p.is_main).cloned())
    }

    async fn save_all(&self, changes: ChangeSet) -> Result<SavedChanges, RepositoryError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        if changes.is_empty() {
            return Ok(SavedChanges::default());
        }

        let mut tables = self.tables()?;
        // Work on a copy so a failed commit leaves nothing behind
        let mut staged = tables.clone();
        let mut saved = SavedChanges::default();

        for photo_id in changes.demotions() {
            let photo = staged
                .photos
                .get_mut(&photo_id)
                .ok_or(RepositoryError::NotFound)?;
            photo.is_main = false;
            saved.rows_affected += 1;
        }

        for photo_id in changes.deleted() {
            staged
                .photos
                .remove(photo_id)
                .ok_or(RepositoryError::NotFound)?;
            saved.rows_affected += 1;
        }

        for new_photo in changes.added() {
            if !staged.ads.contains_key(&new_photo.classified_ad_id) {
                return Err(RepositoryError::Conflict(
                    "classified ad does not exist".to_owned(),
                ));
            }
            staged.next_photo_id += 1;
            let photo = new_photo.clone().into_photo(PhotoId::new(staged.next_photo_id));
            staged.photos.insert(photo.id, photo.clone());
            saved.inserted.push(photo);
            saved.rows_affected += 1;
        }

        for photo_id in changes.promotions() {
            let photo = staged
                .photos
                .get_mut(&photo_id)
                .ok_or(RepositoryError::NotFound)?;
            photo.is_main = true;
            saved.rows_affected += 1;
        }

        staged.check_one_main_per_ad()?;

        *tables = staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(saved)
    }
}
