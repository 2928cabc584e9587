//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use veriframe_client::{ApiClient, ApiConfig, TokenStore};
use veriframe_login::MemoryTokenStore;
use wiremock::MockServer;

pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";
pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const MY_IMAGES_PATH: &str = "/api/images/my-images/";

pub fn memory_store() -> Arc<dyn TokenStore> {
    Arc::new(MemoryTokenStore::new())
}

pub fn config_for(server: &MockServer) -> ApiConfig {
    ApiConfig {
        expiry_grace: Duration::from_millis(10),
        ..ApiConfig::for_base_url(&server.uri()).unwrap()
    }
}

pub fn client_for(server: &MockServer, store: &Arc<dyn TokenStore>) -> ApiClient {
    ApiClient::new(config_for(server), Arc::clone(store)).unwrap()
}

pub fn image_json(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "sha256_hash": format!("hash-{id}"),
        "image_url": format!("http://localhost:8000/media/{id}.jpg"),
        "blockchain_tx": null,
        "deepfake_label": "Real",
        "deepfake_confidence": 0.93,
        "is_verified": false,
        "uploader": 1,
        "uploader_username": "alice",
        "uploaded_at": "2024-05-01T10:20:30Z"
    })
}
