//! Error types for API operations.

use reqwest::StatusCode;
use veriframe_login::StoreError;

/// Why a token refresh could not produce a new access token.
///
/// Cloneable because one refresh result is shared by every request that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Refresh endpoint rejected the token with status {status}")]
    Rejected { status: u16 },

    #[error("No access token received")]
    MissingAccessToken,

    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("Failed to persist refreshed token: {0}")]
    Storage(String),
}

/// Error types for API operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No response was received (connection, timeout, TLS...).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// A 401 could not be recovered because the refresh failed; the local session was wiped.
    #[error("Session expired: {0}")]
    SessionExpired(#[from] RefreshError),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Build an `Api` error from a response status and its raw body.
    pub(crate) fn from_response(status: StatusCode, text: &str) -> Self {
        let body = serde_json::from_str::<serde_json::Value>(text).ok();
        let message = body
            .as_ref()
            .and_then(payload_message)
            .map(str::to_string)
            .or_else(|| {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });

        ClientError::Api {
            status: status.as_u16(),
            message,
            body,
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// The message from the server's JSON error payload, if there was one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { body: Some(body), .. } => payload_message(body),
            _ => None,
        }
    }

    /// The decoded JSON error body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            ClientError::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

fn payload_message(body: &serde_json::Value) -> Option<&str> {
    ["error", "detail"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.as_str()))
}
