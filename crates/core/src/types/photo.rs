//! Photo types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ClassifiedAdId, PhotoId};

/// A photo attached to a classified ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Database ID.
    pub id: PhotoId,
    /// The ad this photo belongs to.
    pub classified_ad_id: ClassifiedAdId,
    /// Delivery URL on the image host.
    pub url: String,
    /// Optional caption supplied at upload time.
    pub description: Option<String>,
    /// When the photo was uploaded.
    pub date_added: DateTime<Utc>,
    /// Image host identifier, `None` for photos that were never hosted remotely.
    pub public_id: Option<String>,
    /// Whether this is the ad's main photo.
    pub is_main: bool,
}

impl Photo {
    /// Project into the shape returned to clients.
    #[must_use]
    pub fn view(&self) -> PhotoView {
        PhotoView {
            id: self.id,
            url: self.url.clone(),
            description: self.description.clone(),
            date_added: self.date_added,
            is_main: self.is_main,
            public_id: self.public_id.clone(),
        }
    }
}

/// A photo that has been uploaded but not committed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub classified_ad_id: ClassifiedAdId,
    pub url: String,
    pub description: Option<String>,
    pub date_added: DateTime<Utc>,
    pub public_id: Option<String>,
    pub is_main: bool,
}

impl NewPhoto {
    /// Attach the ID assigned by the store.
    #[must_use]
    pub fn into_photo(self, id: PhotoId) -> Photo {
        Photo {
            id,
            classified_ad_id: self.classified_ad_id,
            url: self.url,
            description: self.description,
            date_added: self.date_added,
            public_id: self.public_id,
            is_main: self.is_main,
        }
    }
}

/// Photo as returned over HTTP.
///
/// Field names are camelCase to match what the SPA expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    pub id: PhotoId,
    pub url: String,
    pub description: Option<String>,
    pub date_added: DateTime<Utc>,
    pub is_main: bool,
    pub public_id: Option<String>,
}
