//! User accounts.

use serde::{Deserialize, Serialize};

/// A stored user, including the password hash.
///
/// Deliberately not `Serialize`: responses use [`PublicUser`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// UUID v4 assigned at registration.
    pub id: String,
    pub name: String,
    /// Lower-cased, unique.
    pub email: String,
    /// PHC-format Argon2id hash.
    #[serde(rename = "password")]
    pub password_hash: String,
}

/// A user as exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Canonical form of an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
