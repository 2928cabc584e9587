//! Authenticated HTTP client.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use veriframe_common::{ApiConfig, create_client};
use veriframe_login::{ExposeSecret, TokenStore};

use crate::auth::REFRESH_PATH;
use crate::error::{ClientError, RefreshError, Result};
use crate::refresh::{RefreshContext, RefreshCoordinator};
use crate::request::{ApiRequest, AuthPolicy, RequestAttempt, RequestBody, RetryState};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Notifications about the session emitted by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A token refresh failed and the stored credentials were wiped.
    /// The host should send the user back to login.
    Expired { reason: RefreshError },
}

struct Inner {
    http: reqwest::Client,
    config: ApiConfig,
    store: Arc<dyn TokenStore>,
    refresh: RefreshCoordinator,
    refresh_ctx: Arc<RefreshContext>,
    events: broadcast::Sender<SessionEvent>,
}

/// Client for the Veriframe REST API.
///
/// Cheap to clone; clones share the HTTP connection pool, the token store
/// and the in-flight refresh.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("credentials_store", &self.inner.store.mode())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ApiConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = create_client(&config)?;
        Ok(Self::with_http_client(config, store, http))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http_client(
        config: ApiConfig,
        store: Arc<dyn TokenStore>,
        http: reqwest::Client,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let refresh_ctx = Arc::new(RefreshContext {
            http: http.clone(),
            url: config.endpoint(REFRESH_PATH),
            store: Arc::clone(&store),
            events: events.clone(),
            grace: config.expiry_grace,
        });

        Self {
            inner: Arc::new(Inner {
                http,
                config,
                store,
                refresh: RefreshCoordinator::new(),
                refresh_ctx,
                events,
            }),
        }
    }

    /// Receive [`SessionEvent`]s emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        self.inner.config.endpoint(path)
    }

    /// Send a request, refreshing the access token and retrying once on 401.
    ///
    /// The returned response may still carry an error status; see
    /// [`ApiClient::send_json`] for the checked variant.
    pub async fn send(&self, request: ApiRequest) -> Result<Response> {
        let mut attempt = RequestAttempt::new(request);

        loop {
            let response = self.dispatch(&attempt).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            if !attempt.may_refresh() {
                if attempt.retried {
                    attempt.state = RetryState::Failed;
                    warn!(path = %attempt.request.path, "Request still unauthorized after token refresh");
                }
                return Ok(response);
            }

            attempt.state = RetryState::UnauthorizedDetected;
            attempt.retried = true;
            debug!(path = %attempt.request.path, state = ?attempt.state, "Access token rejected");

            attempt.state = RetryState::Refreshing;
            match self.inner.refresh.refresh(&self.inner.refresh_ctx).await {
                Ok(token) => {
                    attempt
                        .request
                        .strip_query_params(&self.inner.config.cache_busting_params);
                    attempt.bearer = Some(token);
                    attempt.state = RetryState::Retrying;
                    debug!(path = %attempt.request.path, state = ?attempt.state, "Retrying with refreshed token");
                }
                Err(err) => {
                    attempt.state = RetryState::Failed;
                    return Err(ClientError::SessionExpired(err));
                }
            }
        }
    }

    /// Send a request and decode a successful JSON response.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send_checked(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a request and return the raw body with its content type.
    pub async fn send_bytes(&self, request: ApiRequest) -> Result<(Bytes, Option<String>)> {
        let response = self.send_checked(request).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        Ok((bytes, content_type))
    }

    async fn send_checked(&self, request: ApiRequest) -> Result<Response> {
        let response = self.send(request).await?;
        ensure_success(response).await
    }

    async fn dispatch(&self, attempt: &RequestAttempt) -> Result<Response> {
        let request = &attempt.request;
        let url = self.endpoint(&request.path);
        let mut builder = self.inner.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if request.auth == AuthPolicy::Bearer {
            let token = match &attempt.bearer {
                Some(token) => Some(token.clone()),
                None => self.inner.store.access_token()?,
            };
            if let Some(token) = token {
                builder = builder.bearer_auth(token.expose_secret());
            }
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(file) => builder.multipart(file.to_form()?),
        };

        debug!(method = %request.method, url = %url, retried = attempt.retried, "Sending request");
        Ok(builder.send().await?)
    }
}

/// Turn an error status into [`ClientError::Api`].
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ClientError::from_response(status, &text))
}
