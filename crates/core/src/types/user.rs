//! Marketplace users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// A marketplace user as shown on their profile page.
///
/// Serialized camelCase for the SPA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Display name, falls back to `username` in the UI when absent.
    pub known_as: Option<String>,
    pub city: Option<String>,
    pub phone_number: Option<String>,
    pub created: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}
