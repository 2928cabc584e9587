//! Image endpoint tests against a mock backend.

mod common;

use common::{REFRESH_PATH, client_for, image_json, memory_store};
use pretty_assertions::assert_eq;
use veriframe_client::images::{
    self, AdminImageFilter, DetectionStage, DuplicateType, UploadOutcome,
};
use veriframe_client::{TokenPair, UploadFile};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png() -> UploadFile {
    UploadFile::new("photo.png", "image/png", b"\x89PNG".to_vec())
}

async fn signed_in(server: &MockServer) -> veriframe_client::ApiClient {
    let store = memory_store();
    store.set(&TokenPair::new("A1", "R1")).unwrap();
    client_for(server, &store)
}

// ============================================================================
// UPLOAD
// ============================================================================

#[tokio::test]
async fn test_upload_returns_stored_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/images/upload/"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(image_json(4)))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    match images::upload_image(&client, png()).await.unwrap() {
        UploadOutcome::Stored(image) => {
            assert_eq!(image.id, 4);
            assert_eq!(image.deepfake_label.as_deref(), Some("Real"));
        }
        other => panic!("expected stored image, got {other:?}"),
    }
}

#[tokio::test]
async fn test_exact_duplicate_is_an_outcome_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/images/upload/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Image Exist",
            "stage": "sha256",
            "duplicate_type": "exact",
            "similarity": 1.0
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let UploadOutcome::Duplicate(report) = images::upload_image(&client, png()).await.unwrap()
    else {
        panic!("expected duplicate");
    };
    assert_eq!(report.stage, DetectionStage::Sha256);
    assert_eq!(report.duplicate_type, DuplicateType::Exact);
    assert_eq!(report.image_id, None);
    assert_eq!(report.similarity, 1.0);
}

#[tokio::test]
async fn test_similar_duplicate_reports_matching_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/images/upload/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Similar image detected",
            "image_id": 17,
            "stage": "sift",
            "duplicate_type": "similar",
            "similarity": 0.87
        })))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let UploadOutcome::Duplicate(report) = images::upload_image(&client, png()).await.unwrap()
    else {
        panic!("expected duplicate");
    };
    assert_eq!(report.stage, DetectionStage::Sift);
    assert_eq!(report.duplicate_type, DuplicateType::Similar);
    assert_eq!(report.image_id, Some(17));
    assert_eq!(report.summary(), "Similar image detected");
}

#[tokio::test]
async fn test_upload_validation_error_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/images/upload/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "No file"})),
        )
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let err = images::upload_image(&client, png()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.server_message(), Some("No file"));
}

// ============================================================================
// LISTINGS
// ============================================================================

#[tokio::test]
async fn test_my_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/images/my-images/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([image_json(1), image_json(2)])),
        )
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let images = images::my_images(&client).await.unwrap();
    assert_eq!(images.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn test_admin_images_sends_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/images/admin/images/"))
        .and(query_param("uploaded_by", "alice"))
        .and(query_param("deepfake_label", "Fake"))
        .and(query_param("is_verified", "true"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total": 11,
            "images": [image_json(11)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let page = images::admin_images(
        &client,
        &AdminImageFilter {
            uploaded_by: Some("alice".to_string()),
            deepfake_label: Some("Fake".to_string()),
            is_verified: Some(true),
            page: Some(2),
            limit: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total, Some(11));
    assert_eq!(page.images[0].id, 11);
}

#[tokio::test]
async fn test_verified_images_accepts_paginated_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/images/admin/images/verified/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "total": 1,
            "images": [image_json(5)]
        })))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let images = images::verified_images(&client).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, 5);
}

#[tokio::test]
async fn test_admin_listing_forbidden_for_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/images/admin/images/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "detail": "You do not have permission to perform this action."
        })))
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let err = images::admin_images(&client, &AdminImageFilter::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}

// ============================================================================
// FILES AND DELETION
// ============================================================================

#[tokio::test]
async fn test_delete_image_returns_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/images/admin/images/8/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Image Delete"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    assert_eq!(images::delete_image(&client, 8).await.unwrap(), "Image Delete");
}

#[tokio::test]
async fn test_delete_missing_image() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/images/admin/images/99/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"error": "Image does not exist"})),
        )
        .mount(&server)
        .await;

    let client = signed_in(&server).await;
    let err = images::delete_image(&client, 99).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.server_message(), Some("Image does not exist"));
}

#[tokio::test]
async fn test_image_url_never_contains_token() {
    let server = MockServer::start().await;
    let client = signed_in(&server).await;

    let url = images::image_url(&client, 42);
    assert_eq!(url, format!("{}/api/images/42/file/", server.uri()));
    assert!(!url.contains("A1"));
}
