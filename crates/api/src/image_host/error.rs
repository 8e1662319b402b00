//! Image host errors.

use thiserror::Error;

/// Errors that can occur when talking to the image host.
#[derive(Debug, Error)]
pub enum ImageHostError {
    /// HTTP request failed.
    #[error("image host request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("image host response error: {0}")]
    Response(String),

    /// The image host rejected the request.
    #[error("image host API error: {0}")]
    Api(String),
}
