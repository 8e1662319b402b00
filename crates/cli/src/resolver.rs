//! Current-user resolver.
//!
//! Fetches the profile of the user a bearer token was issued to before a
//! profile view is shown. Failures never propagate: the caller gets a
//! notification to display and the route to fall back to instead.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use free_ads_core::{User, UserId};

/// Route shown when the current user cannot be loaded.
pub const FALLBACK_ROUTE: &str = "/ads-list";

/// Errors from loading the current user.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The token could not be decoded or has no usable `nameid`.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(String),

    #[error("user {0} not found")]
    NotFound(UserId),

    /// The API answered with an unexpected status.
    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// Failed to parse response.
    #[error("invalid response: {0}")]
    Response(String),
}

/// Outcome of resolving the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(User),
    /// The user could not be loaded; show `notification` and navigate to `to`.
    Redirected {
        notification: String,
        to: &'static str,
    },
}

/// Where user profiles come from.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<User, ClientError>;
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    nameid: String,
}

/// Read the user ID from a token's `nameid` claim.
///
/// The signature is not checked; the API validates the token on every call.
///
/// # Errors
///
/// Returns `InvalidToken` if the token cannot be decoded or the claim is not
/// a user ID.
pub fn token_subject(token: &str) -> Result<UserId, ClientError> {
    let mut validation = Validation::new(Algorithm::HS512);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| ClientError::InvalidToken(e.to_string()))?;

    data.claims
        .nameid
        .parse()
        .map_err(|_| ClientError::InvalidToken(format!("nameid '{}' is not a user ID", data.claims.nameid)))
}

/// Resolves the user a token belongs to.
#[derive(Debug)]
pub struct CurrentUserResolver<S> {
    source: S,
}

impl<S: UserSource> CurrentUserResolver<S> {
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve the current user, always completing.
    #[instrument(skip_all)]
    pub async fn resolve(&self, token: &str) -> Resolution {
        match self.load(token).await {
            Ok(user) => {
                debug!(user_id = %user.id, "Current user resolved");
                Resolution::Resolved(user)
            }
            Err(e) => {
                warn!(error = %e, "Could not resolve current user");
                Resolution::Redirected {
                    notification: format!("Problem retrieving your data: {e}"),
                    to: FALLBACK_ROUTE,
                }
            }
        }
    }

    async fn load(&self, token: &str) -> Result<User, ClientError> {
        let user_id = token_subject(token)?;
        self.source.get_user(user_id).await
    }
}

/// Loads users from the Free Ads API with a bearer token.
#[derive(Clone)]
pub struct HttpUserSource {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl std::fmt::Debug for HttpUserSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpUserSource")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpUserSource {
    #[must_use]
    pub fn new(mut base_url: Url, token: SecretString) -> Self {
        // Keep the base path when joining relative paths
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client: Client::new(),
            base_url,
            token,
        }
    }

    fn user_url(&self, id: UserId) -> Result<Url, ClientError> {
        self.base_url
            .join(&format!("api/users/{id}"))
            .map_err(|e| ClientError::Request(e.to_string()))
    }
}

#[async_trait]
impl UserSource for HttpUserSource {
    #[instrument(skip(self))]
    async fn get_user(&self, id: UserId) -> Result<User, ClientError> {
        let response = self
            .client
            .get(self.user_url(id)?)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|e| ClientError::Response(e.to_string())),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(id)),
            status => Err(ClientError::Status(status)),
        }
    }
}
