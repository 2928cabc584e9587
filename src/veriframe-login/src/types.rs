//! Type definitions for session credentials.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Account role as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Profile returned alongside the tokens at login.
///
/// Fields the client does not know about are kept in `extra` so the cached
/// profile round-trips without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Create a profile with no extra fields.
    pub fn new(id: i64, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            email: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Access and refresh token issued together by the most recent login.
#[derive(Clone)]
pub struct TokenPair {
    access: SecretString,
    refresh: SecretString,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: SecretString::from(refresh.into()),
        }
    }

    pub fn from_secrets(access: SecretString, refresh: SecretString) -> Self {
        Self { access, refresh }
    }

    /// Get the access token (exposes the secret - use sparingly).
    pub fn access(&self) -> &str {
        self.access.expose_secret()
    }

    /// Get the refresh token (exposes the secret - use sparingly).
    pub fn refresh(&self) -> &str {
        self.refresh.expose_secret()
    }

    pub fn access_secret(&self) -> &SecretString {
        &self.access
    }

    pub fn refresh_secret(&self) -> &SecretString {
        &self.refresh
    }
}

/// Everything a token store persists.
///
/// Each field is independent: an access token may be present without a
/// refresh token (for example after a partial write by an older client).
#[derive(Clone, Default)]
pub struct AuthRecord {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<UserProfile>,
}

impl std::fmt::Debug for AuthRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRecord")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user", &self.user)
            .finish()
    }
}

impl AuthRecord {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }

    /// Both tokens, if both are present.
    pub fn token_pair(&self) -> Option<TokenPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => {
                Some(TokenPair::from_secrets(access.clone(), refresh.clone()))
            }
            _ => None,
        }
    }
}

/// On-disk shape of an [`AuthRecord`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoredAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<UserProfile>,
}

impl From<StoredAuth> for AuthRecord {
    fn from(stored: StoredAuth) -> Self {
        Self {
            access_token: stored.access_token.map(SecretString::from),
            refresh_token: stored.refresh_token.map(SecretString::from),
            user: stored.user_data,
        }
    }
}

impl From<&AuthRecord> for StoredAuth {
    fn from(record: &AuthRecord) -> Self {
        Self {
            access_token: record
                .access_token
                .as_ref()
                .map(|s| s.expose_secret().to_string()),
            refresh_token: record
                .refresh_token
                .as_ref()
                .map(|s| s.expose_secret().to_string()),
            user_data: record.user.clone(),
        }
    }
}
