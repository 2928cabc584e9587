//! Authentication endpoints.
//!
//! These calls are sent with [`AuthPolicy::Anonymous`](crate::AuthPolicy):
//! a 401 from the login endpoint means bad credentials, not an expired
//! session, so it must not trigger a token refresh.

use serde::{Deserialize, Serialize};
use tracing::info;
use veriframe_login::{TokenPair, UserProfile};

use crate::client::ApiClient;
use crate::error::Result;
use crate::request::ApiRequest;

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const REGISTER_PATH: &str = "/api/auth/register/";
pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";

/// Username and password for a login attempt. Never persisted.
#[derive(Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of a successful login.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserProfile,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

impl LoginResponse {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair::new(self.access.clone(), self.refresh.clone())
    }
}

/// Registration form.
#[derive(Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

/// Exchange credentials for a token pair and the user's profile.
///
/// Nothing is persisted here; see [`SessionManager::login`](crate::SessionManager::login).
pub async fn login(client: &ApiClient, credentials: &Credentials<'_>) -> Result<LoginResponse> {
    let body = serde_json::to_value(credentials)?;
    let response: LoginResponse = client
        .send_json(ApiRequest::post(LOGIN_PATH).anonymous().json(body))
        .await?;
    info!(username = %response.user.username, role = %response.user.role, "Logged in");
    Ok(response)
}

/// Create an account. Does not sign in.
pub async fn register(client: &ApiClient, account: &NewAccount) -> Result<UserProfile> {
    let body = serde_json::to_value(account)?;
    let user: UserProfile = client
        .send_json(ApiRequest::post(REGISTER_PATH).anonymous().json(body))
        .await?;
    info!(username = %user.username, "Registered account");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "alice",
            password: "hunter2",
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_new_account_omits_missing_email() {
        let account = NewAccount {
            username: "bob".to_string(),
            password: "pw".to_string(),
            email: None,
        };
        assert_eq!(
            serde_json::to_value(&account).unwrap(),
            serde_json::json!({"username": "bob", "password": "pw"})
        );
    }

    #[test]
    fn test_login_response_decodes() {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "refresh": "R1",
            "access": "A1",
            "user": {"id": 1, "username": "alice", "role": "user"}
        }))
        .unwrap();
        let pair = response.token_pair();
        assert_eq!(pair.access(), "A1");
        assert_eq!(pair.refresh(), "R1");
        assert!(!format!("{response:?}").contains("A1"));
    }
}
