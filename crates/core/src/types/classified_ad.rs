//! Classified ads and the main-photo rules.
//!
//! An ad with photos always has exactly one main photo. The rules here decide
//! whether an operation is allowed; persisting the outcome is up to the store.

use thiserror::Error;

use super::id::{ClassifiedAdId, PhotoId, UserId};
use super::photo::Photo;

/// Reasons a photo operation is refused by the main-photo rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhotoRuleError {
    /// The photo is not part of this ad.
    #[error("photo {0} does not belong to this ad")]
    NotInAd(PhotoId),

    /// Set-main was requested for the current main photo.
    #[error("photo {0} is already the main photo")]
    AlreadyMain(PhotoId),

    /// Delete was requested for the current main photo.
    #[error("photo {0} is the main photo and cannot be deleted")]
    MainNotDeletable(PhotoId),
}

/// A classified ad together with its photos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAd {
    pub id: ClassifiedAdId,
    /// Owner of the listing.
    pub user_id: UserId,
    pub title: String,
    pub photos: Vec<Photo>,
}

impl ClassifiedAd {
    /// Whether `user_id` owns this ad.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Find a photo of this ad by ID.
    #[must_use]
    pub fn photo(&self, photo_id: PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }

    /// The current main photo, if any.
    #[must_use]
    pub fn main_photo(&self) -> Option<&Photo> {
        self.photos.iter().find(|p| p.is_main)
    }

    /// Number of photos flagged as main. Anything but 0 or 1 is corrupt data.
    #[must_use]
    pub fn main_photo_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_main).count()
    }

    /// Whether a photo appended now has to become the main photo.
    ///
    /// True exactly when no photo is currently flagged main, so the first
    /// photo of an ad is always main and later ones never displace it.
    #[must_use]
    pub fn next_photo_is_main(&self) -> bool {
        self.main_photo().is_none()
    }

    /// Check that `photo_id` can become the main photo.
    ///
    /// # Errors
    ///
    /// Returns `NotInAd` if the photo is not part of this ad and
    /// `AlreadyMain` if it is already the main photo.
    pub fn promotion_target(&self, photo_id: PhotoId) -> Result<&Photo, PhotoRuleError> {
        let photo = self
            .photo(photo_id)
            .ok_or(PhotoRuleError::NotInAd(photo_id))?;
        if photo.is_main {
            return Err(PhotoRuleError::AlreadyMain(photo_id));
        }
        Ok(photo)
    }

    /// Check that `photo_id` can be deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotInAd` if the photo is not part of this ad and
    /// `MainNotDeletable` if it is the main photo.
    pub fn deletion_target(&self, photo_id: PhotoId) -> Result<&Photo, PhotoRuleError> {
        let photo = self
            .photo(photo_id)
            .ok_or(PhotoRuleError::NotInAd(photo_id))?;
        if photo.is_main {
            return Err(PhotoRuleError::MainNotDeletable(photo_id));
        }
        Ok(photo)
    }
}
