//! User profile handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use free_ads_core::{User, UserId};

use crate::error::AppError;
use crate::messages::Message;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

/// GET /api/users/{id}
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    let locale = state.locale();
    state
        .store()
        .get_user(user_id)
        .await
        .map_err(|e| AppError::store(&e, locale))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(Message::UserNotFound.text(locale).to_string()))
}
