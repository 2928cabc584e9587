//! Rebuildable request descriptions.
//!
//! A `reqwest::RequestBuilder` carrying a multipart body cannot be cloned,
//! so requests are described by [`ApiRequest`] and turned into a builder on
//! every dispatch. A retry after a token refresh therefore sends exactly
//! the same body.

use std::path::Path;

use bytes::Bytes;
use reqwest::Method;

use crate::error::Result;

/// Whether the bearer token and the 401 refresh handling apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    /// Attach the stored access token; refresh and retry once on 401.
    #[default]
    Bearer,
    /// Send without credentials; a 401 is returned to the caller as is.
    Anonymous,
}

/// Progress of one request through the 401 handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryState {
    #[default]
    Initial,
    UnauthorizedDetected,
    Refreshing,
    Retrying,
    Failed,
}

/// A file to send as the `file` part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing the content type from its extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, guess_content_type(path), bytes))
    }

    pub(crate) fn to_form(&self) -> Result<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(self.bytes.to_vec())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)?;
        Ok(reqwest::multipart::Form::new().part("file", part))
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(UploadFile),
}

/// Method, path, query and body of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/api/images/my-images/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub auth: AuthPolicy,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            auth: AuthPolicy::Bearer,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, file: UploadFile) -> Self {
        self.body = RequestBody::Multipart(file);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = AuthPolicy::Anonymous;
        self
    }

    /// Drop query parameters that would make a retry look like a new request.
    pub fn strip_query_params(&mut self, names: &[String]) {
        self.query.retain(|(key, _)| !names.iter().any(|n| n == key));
    }
}

/// One originating request and its retry bookkeeping.
#[derive(Debug)]
pub(crate) struct RequestAttempt {
    pub request: ApiRequest,
    pub state: RetryState,
    /// Set once a refresh has been attempted for this request.
    pub retried: bool,
    /// Token obtained by the refresh, used instead of re-reading the store.
    pub bearer: Option<veriframe_login::SecretString>,
}

impl RequestAttempt {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            state: RetryState::Initial,
            retried: false,
            bearer: None,
        }
    }

    /// A 401 on this attempt may be recovered by a refresh.
    pub fn may_refresh(&self) -> bool {
        !self.retried && self.request.auth == AuthPolicy::Bearer
    }
}
