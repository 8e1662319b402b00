//! Photo lifecycle service.
//!
//! Orchestrates the store and the image host for the three photo mutations:
//!
//! 1. Check that the caller is the user named in the route
//! 2. Load the ad with its photos and check ownership
//! 3. Apply the main-photo rules from [`ClassifiedAd`]
//! 4. Talk to the image host, then commit one [`ChangeSet`]
//!
//! Every mutation that is refused fails before any remote call or write.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use free_ads_core::{
    ClassifiedAd, ClassifiedAdId, NewPhoto, Photo, PhotoId, PhotoRuleError, PhotoView, UserId,
};

use crate::db::{ChangeSet, ClassifiedAdsStore, RepositoryError};
use crate::image_host::{ImageHost, ImageHostError, ImageTransform, ImageUpload};

/// The mutation a persistence failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoOperation {
    Add,
    SetMain,
    Delete,
}

impl std::fmt::Display for PhotoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "add photo",
            Self::SetMain => "set main photo",
            Self::Delete => "delete photo",
        })
    }
}

/// Errors returned by [`PhotoManager`].
#[derive(Debug, Error)]
pub enum PhotoError {
    /// The authenticated caller is not the user in the route.
    #[error("user {caller} cannot act for user {user}")]
    Unauthorized { caller: UserId, user: UserId },

    /// The ad does not exist or belongs to someone else.
    #[error("classified ad {0} is not accessible")]
    AdNotAccessible(ClassifiedAdId),

    /// A main-photo rule refused the operation.
    #[error(transparent)]
    Rule(#[from] PhotoRuleError),

    #[error("photo {0} not found")]
    NotFound(PhotoId),

    /// The uploaded file had no content.
    #[error("uploaded file is empty")]
    EmptyUpload,

    /// The ad has photos but none is flagged main.
    #[error("classified ad {0} has no main photo")]
    MissingMainPhoto(ClassifiedAdId),

    /// The image host answered a delete with something other than `ok`.
    #[error("image host refused to delete {public_id}: {result}")]
    RemoteDeleteFailed { public_id: String, result: String },

    #[error(transparent)]
    ImageHost(#[from] ImageHostError),

    /// The commit failed or wrote nothing.
    #[error("failed to {operation}: {reason}")]
    Persistence {
        operation: PhotoOperation,
        reason: String,
    },

    /// A read from the store failed.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// A photo file received from a client.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub description: Option<String>,
}

/// Check that the authenticated caller is the user named in the route.
///
/// # Errors
///
/// Returns `Unauthorized` when they differ.
pub const fn ensure_caller(caller: UserId, user_id: UserId) -> Result<(), PhotoError> {
    if caller.as_i32() != user_id.as_i32() {
        return Err(PhotoError::Unauthorized {
            caller,
            user: user_id,
        });
    }
    Ok(())
}

/// Photo lifecycle service.
#[derive(Clone)]
pub struct PhotoManager {
    store: Arc<dyn ClassifiedAdsStore>,
    images: Arc<dyn ImageHost>,
}

impl std::fmt::Debug for PhotoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoManager").finish_non_exhaustive()
    }
}

impl PhotoManager {
    #[must_use]
    pub fn new(store: Arc<dyn ClassifiedAdsStore>, images: Arc<dyn ImageHost>) -> Self {
        Self { store, images }
    }

    /// Look up a photo by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no photo has this ID.
    #[instrument(skip(self))]
    pub async fn get_photo(&self, photo_id: PhotoId) -> Result<PhotoView, PhotoError> {
        self.store
            .get_photo(photo_id)
            .await?
            .map(|photo| photo.view())
            .ok_or(PhotoError::NotFound(photo_id))
    }

    /// Load an ad the caller is allowed to change.
    async fn owned_ad(
        &self,
        caller: UserId,
        user_id: UserId,
        ad_id: ClassifiedAdId,
    ) -> Result<ClassifiedAd, PhotoError> {
        ensure_caller(caller, user_id)?;

        match self.store.get_classified_ad_detail(ad_id).await? {
            Some(ad) if ad.is_owned_by(user_id) => Ok(ad),
            _ => Err(PhotoError::AdNotAccessible(ad_id)),
        }
    }

    /// Upload a photo and attach it to an ad.
    ///
    /// The first photo of an ad becomes its main photo. If the commit fails
    /// the uploaded image is removed from the host again.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`/`AdNotAccessible` for a foreign ad,
    /// `EmptyUpload` for an empty file, `ImageHost` if the upload fails and
    /// `Persistence` if the commit fails.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name))]
    pub async fn add_photo(
        &self,
        caller: UserId,
        user_id: UserId,
        ad_id: ClassifiedAdId,
        upload: PhotoUpload,
    ) -> Result<Photo, PhotoError> {
        let ad = self.owned_ad(caller, user_id, ad_id).await?;
        if upload.bytes.is_empty() {
            return Err(PhotoError::EmptyUpload);
        }

        let hosted = self
            .images
            .upload(ImageUpload {
                file_name: upload.file_name,
                content_type: upload.content_type,
                bytes: upload.bytes,
                transform: ImageTransform::AD_PHOTO,
            })
            .await?;

        let mut changes = ChangeSet::new();
        changes.add(NewPhoto {
            classified_ad_id: ad.id,
            url: hosted.url,
            description: upload.description,
            date_added: Utc::now(),
            public_id: Some(hosted.public_id.clone()),
            is_main: ad.next_photo_is_main(),
        });

        let saved = match self.store.save_all(changes).await {
            Ok(saved) => saved,
            Err(e) => {
                self.discard_upload(&hosted.public_id).await;
                return Err(PhotoError::Persistence {
                    operation: PhotoOperation::Add,
                    reason: e.to_string(),
                });
            }
        };

        let Some(photo) = saved.inserted.into_iter().next() else {
            self.discard_upload(&hosted.public_id).await;
            return Err(PhotoError::Persistence {
                operation: PhotoOperation::Add,
                reason: "no photo was inserted".to_string(),
            });
        };

        info!(photo_id = %photo.id, ad_id = %ad.id, is_main = photo.is_main, "Photo added");
        Ok(photo)
    }

    /// Best-effort removal of an image whose record could not be saved.
    async fn discard_upload(&self, public_id: &str) {
        match self.images.destroy(public_id).await {
            Ok(outcome) if outcome.is_ok() => {}
            Ok(outcome) => {
                warn!(public_id, result = %outcome.result, "Orphaned upload was not removed");
            }
            Err(e) => warn!(public_id, error = %e, "Failed to remove orphaned upload"),
        }
    }

    /// Make a photo the ad's main photo, demoting the current one.
    ///
    /// # Errors
    ///
    /// Returns `Rule` if the photo is not in the ad or already main,
    /// `MissingMainPhoto` if the ad has no main photo to demote and
    /// `Persistence` if the commit fails.
    #[instrument(skip(self))]
    pub async fn set_main_photo(
        &self,
        caller: UserId,
        user_id: UserId,
        ad_id: ClassifiedAdId,
        photo_id: PhotoId,
    ) -> Result<(), PhotoError> {
        let ad = self.owned_ad(caller, user_id, ad_id).await?;
        let target = ad.promotion_target(photo_id)?.id;

        let current = self
            .store
            .get_main_photo_for_classified_ad(ad.id)
            .await?
            .ok_or(PhotoError::MissingMainPhoto(ad.id))?;

        let mut changes = ChangeSet::new();
        changes.set_main(current.id, false);
        changes.set_main(target, true);
        self.commit(changes, PhotoOperation::SetMain).await?;

        info!(photo_id = %target, previous = %current.id, "Main photo changed");
        Ok(())
    }

    /// Delete a photo that is not the ad's main photo.
    ///
    /// Hosted photos are removed from the image host first; the record is
    /// only deleted once the host confirms.
    ///
    /// # Errors
    ///
    /// Returns `Rule` if the photo is not in the ad or is the main photo,
    /// `RemoteDeleteFailed` if the host does not confirm the delete and
    /// `Persistence` if the commit fails.
    #[instrument(skip(self))]
    pub async fn delete_photo(
        &self,
        caller: UserId,
        user_id: UserId,
        ad_id: ClassifiedAdId,
        photo_id: PhotoId,
    ) -> Result<(), PhotoError> {
        let ad = self.owned_ad(caller, user_id, ad_id).await?;
        let photo = ad.deletion_target(photo_id)?;

        if let Some(public_id) = photo.public_id.as_deref() {
            let outcome = self.images.destroy(public_id).await?;
            if !outcome.is_ok() {
                return Err(PhotoError::RemoteDeleteFailed {
                    public_id: public_id.to_string(),
                    result: outcome.result,
                });
            }
        }

        let mut changes = ChangeSet::new();
        changes.delete(photo.id);
        self.commit(changes, PhotoOperation::Delete).await?;

        info!(photo_id = %photo_id, ad_id = %ad.id, "Photo deleted");
        Ok(())
    }

    /// Commit changes, treating an empty write as a failure.
    async fn commit(&self, changes: ChangeSet, operation: PhotoOperation) -> Result<(), PhotoError> {
        let saved = self
            .store
            .save_all(changes)
            .await
            .map_err(|e| PhotoError::Persistence {
                operation,
                reason: e.to_string(),
            })?;

        if !saved.any() {
            return Err(PhotoError::Persistence {
                operation,
                reason: "nothing was saved".to_string(),
            });
        }
        Ok(())
    }
}
