//! Unified error handling for the API.
//!
//! Client-facing variants carry an already localized message; the body of an
//! error response is that message as plain text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

use crate::db::RepositoryError;
use crate::messages::{Locale, Message};
use crate::services::{PhotoError, PhotoOperation};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated or not allowed to act on the resource.
    #[error("{0}")]
    Unauthorized(String),

    /// Request was refused.
    #[error("{0}")]
    BadRequest(String),

    /// The image host failed.
    #[error("{0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub fn unauthorized(locale: Locale) -> Self {
        Self::Unauthorized(Message::Unauthorized.text(locale).to_string())
    }

    /// Log a store failure and hide it behind a generic message.
    #[must_use]
    pub fn store(err: &RepositoryError, locale: Locale) -> Self {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Store error");
        Self::Internal(Message::InternalError.text(locale).to_string())
    }

    /// Map a photo service error to its HTTP response.
    ///
    /// A photo that is not part of the ad answers 401 like a foreign ad does.
    #[must_use]
    pub fn from_photo(err: PhotoError, locale: Locale) -> Self {
        let text = |message: Message| message.text(locale).to_string();

        match err {
            PhotoError::Unauthorized { .. }
            | PhotoError::AdNotAccessible(_)
            | PhotoError::Rule(free_ads_core::PhotoRuleError::NotInAd(_)) => {
                warn!(error = %err, "Photo request refused");
                Self::Unauthorized(text(Message::Unauthorized))
            }
            PhotoError::Rule(free_ads_core::PhotoRuleError::AlreadyMain(_)) => {
                Self::BadRequest(text(Message::AlreadyMainPhoto))
            }
            PhotoError::Rule(free_ads_core::PhotoRuleError::MainNotDeletable(_)) => {
                Self::BadRequest(text(Message::CannotDeleteMainPhoto))
            }
            PhotoError::EmptyUpload => Self::BadRequest(text(Message::EmptyUpload)),
            PhotoError::NotFound(_) => Self::NotFound(text(Message::PhotoNotFound)),
            PhotoError::RemoteDeleteFailed { .. } => {
                warn!(error = %err, "Remote photo delete failed");
                Self::BadRequest(text(Message::DeletePhotoFailed))
            }
            PhotoError::MissingMainPhoto(_) => {
                warn!(error = %err, "Ad has no main photo");
                Self::BadRequest(text(Message::SetMainPhotoFailed))
            }
            PhotoError::Persistence { operation, .. } => {
                warn!(error = %err, "Photo changes not saved");
                Self::BadRequest(text(match operation {
                    PhotoOperation::Add => Message::AddPhotoFailed,
                    PhotoOperation::SetMain => Message::SetMainPhotoFailed,
                    PhotoOperation::Delete => Message::DeletePhotoFailed,
                }))
            }
            PhotoError::ImageHost(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Image host error");
                Self::BadGateway(text(Message::ImageHostUnavailable))
            }
            PhotoError::Store(e) => Self::store(&e, locale),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side failures are reported to Sentry where they are mapped
        let status = match &self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: free_ads_core::UserId) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use free_ads_core::{ClassifiedAdId, PhotoId, PhotoRuleError, UserId};

    use super::*;
    use crate::image_host::ImageHostError;

    fn status_of(err: PhotoError) -> StatusCode {
        AppError::from_photo(err, Locale::En).into_response().status()
    }

    #[test]
    fn test_refusals_are_unauthorized() {
        assert_eq!(
            status_of(PhotoError::Unauthorized {
                caller: UserId::new(1),
                user: UserId::new(2),
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(PhotoError::AdNotAccessible(ClassifiedAdId::new(3))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(PhotoError::Rule(PhotoRuleError::NotInAd(PhotoId::new(4)))),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_invalid_state_is_bad_request() {
        assert_eq!(
            status_of(PhotoError::Rule(PhotoRuleError::AlreadyMain(PhotoId::new(1)))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(PhotoError::Rule(PhotoRuleError::MainNotDeletable(PhotoId::new(1)))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(PhotoError::EmptyUpload), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_persistence_messages_follow_operation() {
        let err = AppError::from_photo(
            PhotoError::Persistence {
                operation: PhotoOperation::SetMain,
                reason: "constraint violation".to_string(),
            },
            Locale::En,
        );
        assert_eq!(err.to_string(), "Could not set the photo to main");

        let err = AppError::from_photo(
            PhotoError::MissingMainPhoto(ClassifiedAdId::new(1)),
            Locale::Mk,
        );
        assert_eq!(
            err.to_string(),
            "Грешка при поставување на сликата главна слика на огласот"
        );
    }

    #[test]
    fn test_remote_delete_failure() {
        let err = AppError::from_photo(
            PhotoError::RemoteDeleteFailed {
                public_id: "ads/1".to_string(),
                result: "not found".to_string(),
            },
            Locale::Mk,
        );
        assert_eq!(err.to_string(), "Грешка при бришење на сликата");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_image_host_is_bad_gateway() {
        assert_eq!(
            status_of(PhotoError::ImageHost(ImageHostError::Api(
                "Invalid Signature".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_not_found() {
        assert_eq!(
            status_of(PhotoError::NotFound(PhotoId::new(9))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_store_error_is_internal() {
        assert_eq!(
            status_of(PhotoError::Store(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
