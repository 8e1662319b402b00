//! Ad photo handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use tracing::{instrument, warn};

use free_ads_core::{ClassifiedAdId, PhotoId, PhotoView, UserId};

use crate::error::AppError;
use crate::messages::{Locale, Message};
use crate::middleware::AuthenticatedUser;
use crate::services::{PhotoUpload, ensure_caller};
use crate::state::AppState;

/// Multipart field holding the image.
const FILE_FIELD: &str = "file";
/// Multipart field holding the optional caption.
const DESCRIPTION_FIELD: &str = "description";

/// GET /api/{user_id}/photos/{id}
///
/// Any authenticated caller may read a photo.
#[instrument(skip(state))]
pub async fn get_photo(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path((_user_id, photo_id)): Path<(UserId, PhotoId)>,
) -> Result<Json<PhotoView>, AppError> {
    state
        .photos()
        .get_photo(photo_id)
        .await
        .map(Json)
        .map_err(|e| AppError::from_photo(e, state.locale()))
}

/// POST /api/{user_id}/photos/{id}
///
/// Multipart form with a `file` and an optional `description`. Answers 201
/// with a `Location` pointing at the new photo.
///
/// The caller is checked before the body is read.
#[instrument(skip(state, multipart))]
pub async fn add_photo(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((user_id, ad_id)): Path<(UserId, ClassifiedAdId)>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let locale = state.locale();
    ensure_caller(caller, user_id).map_err(|e| AppError::from_photo(e, locale))?;

    let multipart = multipart.map_err(|e| {
        warn!(error = %e, "Request is not a multipart form");
        AppError::BadRequest(Message::AddPhotoFailed.text(locale).to_string())
    })?;
    let upload = read_upload(multipart, locale).await?;

    let photo = state
        .photos()
        .add_photo(caller, user_id, ad_id, upload)
        .await
        .map_err(|e| AppError::from_photo(e, locale))?;

    let location = format!("/api/{user_id}/photos/{}", photo.id);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(photo.view()),
    ))
}

/// POST /api/{user_id}/photos/{id}/setMain/{photo_id}
#[instrument(skip(state))]
pub async fn set_main_photo(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((user_id, ad_id, photo_id)): Path<(UserId, ClassifiedAdId, PhotoId)>,
) -> Result<StatusCode, AppError> {
    state
        .photos()
        .set_main_photo(caller, user_id, ad_id, photo_id)
        .await
        .map_err(|e| AppError::from_photo(e, state.locale()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/{user_id}/photos/{id}/{photo_id}
#[instrument(skip(state))]
pub async fn delete_photo(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((user_id, ad_id, photo_id)): Path<(UserId, ClassifiedAdId, PhotoId)>,
) -> Result<StatusCode, AppError> {
    state
        .photos()
        .delete_photo(caller, user_id, ad_id, photo_id)
        .await
        .map_err(|e| AppError::from_photo(e, state.locale()))?;

    Ok(StatusCode::OK)
}

/// Collect the photo fields of a multipart form.
///
/// A missing `file` field yields an empty upload, which the photo service
/// refuses after its ownership checks.
async fn read_upload(mut multipart: Multipart, locale: Locale) -> Result<PhotoUpload, AppError> {
    let bad_form = |e: &dyn std::fmt::Display| {
        warn!(error = %e, "Invalid multipart form");
        AppError::BadRequest(Message::AddPhotoFailed.text(locale).to_string())
    };

    let mut upload = PhotoUpload {
        file_name: String::new(),
        content_type: None,
        bytes: Vec::new(),
        description: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_form(&e))? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                upload.file_name = field.file_name().unwrap_or("photo").to_string();
                upload.content_type = field.content_type().map(String::from);
                upload.bytes = field.bytes().await.map_err(|e| bad_form(&e))?.to_vec();
            }
            Some(DESCRIPTION_FIELD) => {
                let text = field.text().await.map_err(|e| bad_form(&e))?;
                upload.description = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    Ok(upload)
}
