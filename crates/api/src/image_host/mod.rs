//! Remote image hosting.
//!
//! Photos are stored on an external host that resizes them on upload and
//! serves them from a public URL. The photo service only sees the
//! [`ImageHost`] trait; [`CloudinaryClient`] is the production implementation.

mod cloudinary;
mod error;

use async_trait::async_trait;

pub use cloudinary::CloudinaryClient;
pub use error::ImageHostError;

/// Resize applied by the host when an image is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: u32,
    pub height: u32,
}

impl ImageTransform {
    /// Size every ad photo is stored at.
    pub const AD_PHOTO: Self = Self {
        width: 500,
        height: 500,
    };

    /// Transformation string in the host's URL syntax, e.g. `w_500,h_500`.
    #[must_use]
    pub fn to_param(self) -> String {
        format!("w_{},h_{}", self.width, self.height)
    }
}

/// An image to upload.
#[derive(Clone)]
pub struct ImageUpload {
    /// Original file name as sent by the client.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub transform: ImageTransform,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("transform", &self.transform)
            .finish()
    }
}

/// A successfully hosted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Public delivery URL.
    pub url: String,
    /// Host identifier used for later deletion.
    pub public_id: String,
}

/// Result reported by the host for a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyOutcome {
    /// Raw result string; `"ok"` on success, e.g. `"not found"` otherwise.
    pub result: String,
}

impl DestroyOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result == "ok"
    }
}

/// Remote storage for ad photos.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload an image, applying its transform.
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, ImageHostError>;

    /// Delete a hosted image.
    ///
    /// A host that answers but refuses the delete is reported through
    /// [`DestroyOutcome`], not as an error.
    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome, ImageHostError>;
}
