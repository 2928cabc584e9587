//! Access token refresh.
//!
//! The refresh call goes straight to the HTTP client and never through the
//! 401 handler. Concurrent callers share one in-flight refresh; when it
//! fails, the store wipe and the expiry event happen once inside the shared
//! future, not once per waiting request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use veriframe_login::{ExposeSecret, SecretString, TokenPair, TokenStore};

use crate::client::SessionEvent;
use crate::error::RefreshError;

type RefreshResult = std::result::Result<SecretString, RefreshError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Everything the refresh call needs, detached from the client so the
/// shared future can own it.
pub(crate) struct RefreshContext {
    pub http: reqwest::Client,
    pub url: String,
    pub store: Arc<dyn TokenStore>,
    pub events: broadcast::Sender<SessionEvent>,
    /// Delay between the store wipe and the expiry notification.
    pub grace: Duration,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

type Slot = Arc<Mutex<Option<(u64, SharedRefresh)>>>;

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    in_flight: Slot,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain a fresh access token, joining a refresh that is already running.
    ///
    /// The refresh runs on its own task, so it completes and frees the slot
    /// even when every waiting request is dropped.
    pub async fn refresh(&self, ctx: &Arc<RefreshContext>) -> RefreshResult {
        let shared = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some((_, shared)) => {
                    debug!("Joining in-flight token refresh");
                    shared.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let shared = spawn_refresh(id, Arc::clone(ctx), Arc::clone(&self.in_flight));
                    *slot = Some((id, shared.clone()));
                    shared
                }
            }
        };

        shared.await
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.in_flight.lock().is_none()
    }
}

fn spawn_refresh(id: u64, ctx: Arc<RefreshContext>, in_flight: Slot) -> SharedRefresh {
    let task = tokio::spawn(async move {
        let result = run_refresh(&ctx).await;
        let mut slot = in_flight.lock();
        if matches!(slot.as_ref(), Some((current, _)) if *current == id) {
            *slot = None;
        }
        result
    });

    task.map(|joined| {
        joined.unwrap_or_else(|e| Err(RefreshError::Transport(format!("refresh task failed: {e}"))))
    })
    .boxed()
    .shared()
}

async fn run_refresh(ctx: &RefreshContext) -> RefreshResult {
    match request_new_token(ctx).await {
        Ok(token) => {
            info!("Access token refreshed");
            Ok(token)
        }
        Err(err) => {
            warn!(error = %err, "Token refresh failed, clearing session");
            if let Err(e) = ctx.store.clear() {
                warn!(error = %e, "Failed to clear credentials after refresh failure");
            }

            let events = ctx.events.clone();
            let grace = ctx.grace;
            let reason = err.clone();
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                // No subscribers is fine
                let _ = events.send(SessionEvent::Expired { reason });
            });

            Err(err)
        }
    }
}

async fn request_new_token(ctx: &RefreshContext) -> RefreshResult {
    let refresh = ctx
        .store
        .refresh_token()
        .map_err(|e| RefreshError::Storage(e.to_string()))?
        .ok_or(RefreshError::MissingRefreshToken)?;

    debug!(url = %ctx.url, "Requesting new access token");
    let response = ctx
        .http
        .post(&ctx.url)
        .json(&serde_json::json!({ "refresh": refresh.expose_secret() }))
        .send()
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RefreshError::Rejected {
            status: status.as_u16(),
        });
    }

    let body: RefreshResponse = response
        .json()
        .await
        .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

    let access = body
        .access
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
        .ok_or(RefreshError::MissingAccessToken)?;

    let persisted = match body.refresh.filter(|token| !token.is_empty()) {
        Some(rotated) => {
            debug!("Refresh token rotated");
            ctx.store.set(&TokenPair::from_secrets(
                access.clone(),
                SecretString::from(rotated),
            ))
        }
        None => ctx.store.set_access_token(&access),
    };
    persisted.map_err(|e| RefreshError::Storage(e.to_string()))?;

    Ok(access)
}
