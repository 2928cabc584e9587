//! Veriframe API client.
//!
//! All traffic goes through [`ApiClient`], which attaches the stored
//! access token as a bearer credential and recovers from an expired token
//! by refreshing it once and retrying the request. Concurrent requests that
//! hit a 401 share a single refresh call. When the refresh fails the token
//! store is wiped and a [`SessionEvent::Expired`] is broadcast so the host
//! can send the user back to login.
//!
//! On top of the client sit:
//! - [`SessionManager`] - login / register / logout and derived session state
//! - [`auth`] and [`images`] - typed wrappers for each endpoint

pub mod auth;
pub mod images;

mod client;
mod error;
mod refresh;
mod request;
mod session;

pub use client::{ApiClient, SessionEvent};
pub use error::{ClientError, RefreshError, Result};
pub use request::{ApiRequest, AuthPolicy, RequestBody, RetryState, UploadFile};
pub use session::{SessionManager, SessionState};

pub use veriframe_common::ApiConfig;
pub use veriframe_login::{Role, TokenPair, TokenStore, UserProfile};
