//! Client-side session state.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use veriframe_login::UserProfile;

use crate::auth::{self, Credentials, NewAccount};
use crate::client::{ApiClient, SessionEvent};
use crate::error::{ClientError, RefreshError, Result};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Snapshot of the session as the UI sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    /// True while login, registration or bootstrap is in progress.
    pub loading: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserProfile::is_admin)
    }
}

/// Login, registration and logout on top of an [`ApiClient`].
///
/// Operations are serialized so `loading` transitions never interleave.
pub struct SessionManager {
    client: ApiClient,
    state: RwLock<SessionState>,
    op_lock: Mutex<()>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("client", &self.client)
            .field("state", &*self.state.read())
            .finish()
    }
}

impl SessionManager {
    /// Starts in the loading state until [`SessionManager::bootstrap`] runs.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: RwLock::new(SessionState {
                loading: true,
                ..SessionState::default()
            }),
            op_lock: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.state.read().is_admin()
    }

    /// Restore the session from the token store without touching the network.
    ///
    /// The cached profile is only trusted when an access token is stored
    /// next to it.
    pub async fn bootstrap(&self) -> Result<Option<UserProfile>> {
        let _op = self.op_lock.lock().await;
        let record = self.client.store().load();

        let mut state = self.state.write();
        state.loading = false;
        let record = record?;
        state.user = match (&record.access_token, record.user) {
            (Some(_), Some(user)) => {
                debug!(username = %user.username, "Restored session from token store");
                Some(user)
            }
            _ => None,
        };
        Ok(state.user.clone())
    }

    /// Sign in and persist the token pair and profile.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        let _op = self.op_lock.lock().await;
        self.begin();

        let credentials = Credentials { username, password };
        let result = match auth::login(&self.client, &credentials).await {
            Ok(response) => self.persist_login(&response).map(|()| response.user),
            Err(err) => Err(err),
        };

        let mut state = self.state.write();
        state.loading = false;
        match &result {
            Ok(user) => {
                state.user = Some(user.clone());
                state.last_error = None;
            }
            Err(err) => {
                warn!(username, error = %err, "Login failed");
                state.last_error = Some(failure_message(err, LOGIN_FAILED));
            }
        }
        result
    }

    /// Create an account. The session stays signed out.
    pub async fn register(&self, account: &NewAccount) -> Result<UserProfile> {
        let _op = self.op_lock.lock().await;
        self.begin();

        let result = auth::register(&self.client, account).await;

        let mut state = self.state.write();
        state.loading = false;
        match &result {
            Ok(_) => state.last_error = None,
            Err(err) => {
                warn!(username = %account.username, error = %err, "Registration failed");
                state.last_error = Some(failure_message(err, REGISTRATION_FAILED));
            }
        }
        result
    }

    /// Forget the tokens and the cached profile.
    pub async fn logout(&self) -> Result<()> {
        let _op = self.op_lock.lock().await;
        self.clear_session()
    }

    /// Follow [`SessionEvent::Expired`] by dropping the in-memory user.
    ///
    /// The store was already wiped by the failed refresh, so the watcher
    /// never clears it again; a login that lands during the grace delay
    /// keeps its tokens. The task ends when the manager or the client's event channel is dropped.
    pub fn watch_expiry(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.client.subscribe();
        let manager: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired { reason }) => {
                        let Some(session) = manager.upgrade() else {
                            break;
                        };
                        session.expire(&reason).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Session events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn expire(&self, reason: &RefreshError) {
        let _op = self.op_lock.lock().await;
        match self.client.store().access_token() {
            Ok(Some(_)) => {
                debug!(reason = %reason, "Ignoring expiry, session was re-established");
            }
            Ok(None) => {
                info!(reason = %reason, "Session expired");
                self.state.write().user = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read credentials after expiry");
                self.state.write().user = None;
            }
        }
    }

    fn begin(&self) {
        let mut state = self.state.write();
        state.loading = true;
        state.last_error = None;
    }

    fn persist_login(&self, response: &auth::LoginResponse) -> Result<()> {
        let store = self.client.store();
        store.set(&response.token_pair())?;
        store.set_cached_user(&response.user)?;
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        let cleared = self.client.store().clear();
        self.state.write().user = None;
        cleared?;
        info!("Logged out");
        Ok(())
    }
}

fn failure_message(err: &ClientError, fallback: &str) -> String {
    err.server_message()
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
