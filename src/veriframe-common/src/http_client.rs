//! HTTP client factory.
//!
//! All clients carry the Veriframe User-Agent and the timeouts from
//! [`ApiConfig`]. Redirects are not followed automatically so an auth
//! header never leaks to another host.

use reqwest::Client;
use std::time::Duration;

use crate::config::ApiConfig;

/// User-Agent string for all HTTP requests
pub const USER_AGENT: &str = concat!("veriframe/", env!("CARGO_PKG_VERSION"));

/// Idle pooled connections are dropped after this long so DNS changes are picked up.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates a client builder with the standard configuration applied.
pub fn create_client_builder(config: &ApiConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .redirect(reqwest::redirect::Policy::none())
        .tcp_nodelay(true)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(4)
}

/// Creates a client with the standard configuration.
pub fn create_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    create_client_builder(config).build()
}
