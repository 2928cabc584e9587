//! End-to-end tests of the 401 refresh-and-retry pipeline.

mod common;

use std::time::Duration;

use common::{MY_IMAGES_PATH, REFRESH_PATH, client_for, image_json, memory_store};
use pretty_assertions::assert_eq;
use veriframe_client::images::{self, UploadOutcome};
use veriframe_client::{ApiRequest, ClientError, RefreshError, SessionEvent, TokenPair, UploadFile};
use veriframe_login::SecretString;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_my_images(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(MY_IMAGES_PATH))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Given token not valid for any token type"
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(MY_IMAGES_PATH))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([image_json(1)])))
        .mount(server)
        .await;
}

// ============================================================================
// SINGLE REQUEST
// ============================================================================

mod single_request {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_retried_once() {
        let server = MockServer::start().await;
        mount_my_images(&server).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(serde_json::json!({"refresh": "R1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "A2"})))
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        let images = images::my_images(&client).await.unwrap();
        assert_eq!(images.len(), 1);

        let pair = store.get().unwrap().unwrap();
        assert_eq!(pair.access(), "A2");
        assert_eq!(pair.refresh(), "R1");

        let received = server.received_requests().await.unwrap();
        let image_calls = received
            .iter()
            .filter(|r| r.url.path() == MY_IMAGES_PATH)
            .count();
        assert_eq!(image_calls, 2);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_wipes_store_without_refresh_call() {
        let server = MockServer::start().await;
        mount_my_images(&server).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = memory_store();
        store
            .set_access_token(&SecretString::from("A1".to_string()))
            .unwrap();
        let client = client_for(&server, &store);

        let err = images::my_images(&client).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::SessionExpired(RefreshError::MissingRefreshToken)
        ));
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_retry_is_not_refreshed_again() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MY_IMAGES_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "A2"})))
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        let err = images::my_images(&client).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(matches!(err, ClientError::Api { .. }));

        // The refreshed token is kept; only a failed refresh wipes the store
        assert_eq!(store.get().unwrap().unwrap().access(), "A2");
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_store_and_reports_expiry() {
        let server = MockServer::start().await;
        mount_my_images(&server).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "Token is blacklisted"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);
        let mut events = client.subscribe();

        let err = images::my_images(&client).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::SessionExpired(RefreshError::Rejected { status: 401 })
        ));
        assert!(store.get().unwrap().is_none());

        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("expiry event")
            .unwrap();
        assert_eq!(
            event,
            SessionEvent::Expired {
                reason: RefreshError::Rejected { status: 401 }
            }
        );
    }

    #[tokio::test]
    async fn test_other_errors_pass_through_without_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(MY_IMAGES_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        let err = images::my_images(&client).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Server returned 500: boom");
        assert_eq!(store.get().unwrap().unwrap().access(), "A1");
    }
}

// ============================================================================
// RETRIED REQUEST CONTENT
// ============================================================================

mod retried_request {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_cache_busting_param_is_dropped_on_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/images/3/file/"))
            .and(header("Authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/images/3/file/"))
            .and(header("Authorization", "Bearer A2"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "A2"})))
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        let file = images::fetch_image(&client, 3).await.unwrap();
        assert_eq!(file.bytes.as_ref(), &[1, 2, 3]);
        assert_eq!(file.content_type.as_deref(), Some("image/png"));

        let file_requests: Vec<_> = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/api/images/3/file/")
            .collect();
        assert_eq!(file_requests.len(), 2);
        assert!(file_requests[0].url.query_pairs().any(|(k, _)| k == "t"));
        assert!(!file_requests[1].url.query_pairs().any(|(k, _)| k == "t"));
    }

    #[tokio::test]
    async fn test_multipart_upload_is_resent_intact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/images/upload/"))
            .and(header("Authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/images/upload/"))
            .and(header("Authorization", "Bearer A2"))
            .respond_with(ResponseTemplate::new(201).set_body_json(image_json(9)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access": "A2"})))
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        let outcome = images::upload_image(
            &client,
            UploadFile::new("cat.png", "image/png", b"PNGDATA".to_vec()),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, UploadOutcome::Stored(ref image) if image.id == 9));

        let uploads: Vec<_> = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == "/api/images/upload/")
            .collect();
        assert_eq!(uploads.len(), 2);
        for upload in &uploads {
            let body = String::from_utf8_lossy(&upload.body);
            assert!(body.contains("PNGDATA"));
            assert!(body.contains("filename=\"cat.png\""));
        }
    }

    #[tokio::test]
    async fn test_refresh_rotation_replaces_both_tokens() {
        let server = MockServer::start().await;
        mount_my_images(&server).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "A2", "refresh": "R2"})),
            )
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        client
            .send_json::<serde_json::Value>(ApiRequest::get(MY_IMAGES_PATH))
            .await
            .unwrap();

        let pair = store.get().unwrap().unwrap();
        assert_eq!(pair.access(), "A2");
        assert_eq!(pair.refresh(), "R2");
    }
}

// ============================================================================
// CONCURRENT REQUESTS
// ============================================================================

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_concurrent_unauthorized_requests_share_one_refresh() {
        let server = MockServer::start().await;
        mount_my_images(&server).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "A2"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        let results =
            futures::future::join_all((0..5).map(|_| images::my_images(&client))).await;
        for result in results {
            assert_eq!(result.unwrap().len(), 1);
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn test_concurrent_failure_wipes_and_notifies_once() {
        let server = MockServer::start().await;
        mount_my_images(&server).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(200)))
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);
        let mut events = client.subscribe();

        let results =
            futures::future::join_all((0..3).map(|_| images::my_images(&client))).await;
        for result in results {
            assert!(matches!(
                result.unwrap_err(),
                ClientError::SessionExpired(RefreshError::Rejected { status: 401 })
            ));
        }
        assert!(store.load().unwrap().is_empty());

        let first = tokio::time::timeout(Duration::from_secs(2), events.recv()).await;
        assert!(matches!(first, Ok(Ok(SessionEvent::Expired { .. }))));
        let second = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
        assert!(second.is_err(), "only one expiry event expected");
    }

    #[tokio::test]
    async fn test_cancelled_request_does_not_strand_refresh() {
        let server = MockServer::start().await;
        mount_my_images(&server).await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access": "A2"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = memory_store();
        store.set(&TokenPair::new("A1", "R1")).unwrap();
        let client = client_for(&server, &store);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(100), images::my_images(&client)).await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.get().unwrap().unwrap().access(), "A2");

        let images = images::my_images(&client).await.unwrap();
        assert_eq!(images.len(), 1);
    }
}
