//! Bearer token authentication.
//!
//! Tokens are HS512 JWTs issued by the account service. The caller's user ID
//! is carried as a string in the `nameid` claim.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use free_ads_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Claims read from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID as a decimal string.
    pub nameid: String,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
}

/// Reasons a request is not authenticated.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("invalid nameid claim '{0}'")]
    InvalidSubject(String),
}

/// Validates bearer tokens against the shared signing secret.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithm", &Algorithm::HS512)
            .finish_non_exhaustive()
    }
}

impl TokenValidator {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS512),
        }
    }

    /// Validate a token and return the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for a bad signature, a wrong algorithm or an
    /// expired token, and `InvalidSubject` if `nameid` is not a user ID.
    pub fn validate(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        data.claims
            .nameid
            .parse()
            .map_err(|_| AuthError::InvalidSubject(data.claims.nameid))
    }

    /// Validate the `Authorization: Bearer ...` header of a request.
    ///
    /// # Errors
    ///
    /// Returns `MissingToken` if there is no bearer token, otherwise the
    /// errors of [`validate`](Self::validate).
    pub fn authenticate(&self, parts: &Parts) -> Result<UserId, AuthError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.validate(token)
    }
}

/// Extractor for the authenticated caller.
///
/// Rejects the request with 401 if the bearer token is missing or invalid.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthenticatedUser(caller): AuthenticatedUser) -> String {
///     format!("Hello, user {caller}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = state.tokens().authenticate(parts).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AppError::unauthorized(state.locale())
        })?;
        set_sentry_user(user_id);
        Ok(Self(user_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    const SECRET: &str = "kT8#vQ2!pL9$wX4&zR7*mN3^bH6@cJ1%";

    fn token(algorithm: Algorithm, secret: &str, nameid: &str, exp: i64) -> String {
        let claims = Claims {
            nameid: nameid.to_string(),
            exp,
            unique_name: Some("ana".to_string()),
        };
        encode(
            &Header::new(algorithm),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    fn validator() -> TokenValidator {
        TokenValidator::new(&SecretString::from(SECRET))
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/1/photos/1");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_valid_token() {
        let t = token(Algorithm::HS512, SECRET, "7", in_one_hour());
        assert_eq!(validator().validate(&t).unwrap(), UserId::new(7));
    }

    #[test]
    fn test_wrong_secret() {
        let t = token(Algorithm::HS512, "another-secret-of-enough-length!!", "7", in_one_hour());
        assert!(matches!(
            validator().validate(&t),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_algorithm() {
        let t = token(Algorithm::HS256, SECRET, "7", in_one_hour());
        assert!(matches!(
            validator().validate(&t),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let t = token(Algorithm::HS512, SECRET, "7", chrono::Utc::now().timestamp() - 3600);
        assert!(matches!(
            validator().validate(&t),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_non_numeric_subject() {
        let t = token(Algorithm::HS512, SECRET, "ana", in_one_hour());
        assert!(matches!(
            validator().validate(&t),
            Err(AuthError::InvalidSubject(s)) if s == "ana"
        ));
    }

    #[test]
    fn test_authenticate_reads_bearer_header() {
        let t = token(Algorithm::HS512, SECRET, "3", in_one_hour());
        let parts = parts_with(Some(&format!("Bearer {t}")));
        assert_eq!(validator().authenticate(&parts).unwrap(), UserId::new(3));
    }

    #[test]
    fn test_authenticate_missing_or_malformed_header() {
        assert!(matches!(
            validator().authenticate(&parts_with(None)),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            validator().authenticate(&parts_with(Some("Basic abc"))),
            Err(AuthError::MissingToken)
        ));
    }
}
