//! Wiremock integration tests for PublishClient.
//!
//! Credentials are verified once at connect, then each publish is an
//! upload followed by a status update referencing the media id.

use std::time::Duration;

use bytes::Bytes;
use tweeter::config::PublishCredentials;
use tweeter::providers::{PublishClient, PublishEndpoints, Publisher};
use tweeter::{PublishError, TweeterError};
use wiremock::matchers::{body_string_contains, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);
const MEDIA_ID: &str = "710511363345354753";

fn credentials() -> PublishCredentials {
    PublishCredentials {
        access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".into(),
        access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".into(),
        consumer_key: "xvz1evFS4wEEPTGEFPHBog".into(),
        consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".into(),
    }
}

/// Mount a successful verify_credentials reply for `camera_thing`.
async fn mount_verify(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .and(query_param("include_email", "true"))
        .and(query_param("skip_status", "true"))
        .and(header_regex("authorization", "^OAuth .*oauth_signature=\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id_str": "370773112",
            "screen_name": "camera_thing",
            "name": "Camera"
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn connect(server: &MockServer) -> PublishClient {
    match PublishClient::connect(
        Some(credentials()),
        PublishEndpoints::single(server.uri()),
        TIMEOUT,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => panic!("connect should succeed: {e}"),
    }
}

#[tokio::test]
async fn test_connect_without_credentials_is_log_only() {
    let client = PublishClient::connect(None, PublishEndpoints::default(), TIMEOUT)
        .await
        .ok()
        .expect("log-only connect never fails");

    assert!(client.is_log_only());
    assert_eq!(client.account(), None);
}

#[tokio::test]
async fn test_log_only_publish_returns_empty_receipt() {
    let client = PublishClient::log_only();
    let receipt = client
        .publish("#PolarBear\n#Snow", Bytes::from_static(b"img"))
        .await
        .unwrap();

    assert!(receipt.is_empty());
    assert_eq!(receipt.url(), None);
}

#[tokio::test]
async fn test_connect_verifies_credentials() {
    let mock_server = MockServer::start().await;
    mount_verify(&mock_server).await;

    let client = connect(&mock_server).await;
    assert!(!client.is_log_only());
    assert_eq!(client.account(), Some("camera_thing"));
}

#[tokio::test]
async fn test_connect_rejected_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errors": [{ "code": 32, "message": "Could not authenticate you." }]
        })))
        .mount(&mock_server)
        .await;

    let result = PublishClient::connect(
        Some(credentials()),
        PublishEndpoints::single(mock_server.uri()),
        TIMEOUT,
    )
    .await;

    let Err(err) = result else {
        panic!("connect should fail on 401");
    };
    assert!(
        matches!(
            err,
            TweeterError::Publish(PublishError::Authentication { status: 401 })
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_publish_uploads_then_creates() {
    let mock_server = MockServer::start().await;
    mount_verify(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(header_regex("authorization", "^OAuth "))
        .and(body_string_contains("name=\"media\"; filename=\"tweet_image\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "media_id": 710511363345354753u64,
            "media_id_string": MEDIA_ID,
            "size": 11065
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/1.1/statuses/update.json"))
        .and(header_regex(
            "content-type",
            "^application/x-www-form-urlencoded",
        ))
        .and(body_string_contains("status=%23PolarBear%20%23Snow"))
        .and(body_string_contains(format!("media_ids={MEDIA_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id_str": "1050118621198921728",
            "text": "#PolarBear #Snow",
            "user": { "screen_name": "camera_thing" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = connect(&mock_server).await;
    let receipt = client
        .publish("#PolarBear #Snow", Bytes::from_static(b"jpeg bytes"))
        .await
        .expect("publish should succeed");

    assert_eq!(receipt.post_id.as_deref(), Some("1050118621198921728"));
    assert_eq!(
        receipt.url().as_deref(),
        Some("https://twitter.com/camera_thing/status/1050118621198921728")
    );
}

/// A receipt without `user` falls back to the verified account.
#[tokio::test]
async fn test_publish_author_falls_back_to_account() {
    let mock_server = MockServer::start().await;
    mount_verify(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "media_id_string": MEDIA_ID })),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/1.1/statuses/update.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id_str": "42" })),
        )
        .mount(&mock_server)
        .await;

    let client = connect(&mock_server).await;
    let receipt = client
        .publish("Untitled", Bytes::from_static(b"jpeg"))
        .await
        .unwrap();
    assert_eq!(receipt.author.as_deref(), Some("camera_thing"));
}

#[tokio::test]
async fn test_upload_failure_skips_create() {
    let mock_server = MockServer::start().await;
    mount_verify(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "errors": [{ "code": 324, "message": "Image file is invalid" }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/1.1/statuses/update.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = connect(&mock_server).await;
    let err = client
        .publish("Untitled", Bytes::from_static(b"jpeg"))
        .await
        .unwrap_err();

    match err {
        PublishError::Upload { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("Image file is invalid"), "{message}");
            assert!(message.contains("324"), "{message}");
        }
        other => panic!("expected upload error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_failure() {
    let mock_server = MockServer::start().await;
    mount_verify(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "media_id_string": MEDIA_ID })),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/1.1/statuses/update.json"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "errors": [{ "code": 187, "message": "Status is a duplicate." }]
        })))
        .mount(&mock_server)
        .await;

    let client = connect(&mock_server).await;
    let err = client
        .publish("Untitled", Bytes::from_static(b"jpeg"))
        .await
        .unwrap_err();

    match err {
        PublishError::Create { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("duplicate"), "{message}");
        }
        other => panic!("expected create error, got {other:?}"),
    }
}

/// Non-JSON error bodies are cut short rather than echoed whole.
#[tokio::test]
async fn test_error_body_is_truncated() {
    let mock_server = MockServer::start().await;
    mount_verify(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/1.1/media/upload.json"))
        .respond_with(ResponseTemplate::new(502).set_body_string("x".repeat(5000)))
        .mount(&mock_server)
        .await;

    let client = connect(&mock_server).await;
    let err = client
        .publish("Untitled", Bytes::from_static(b"jpeg"))
        .await
        .unwrap_err();

    match err {
        PublishError::Upload { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message.len(), 200);
        }
        other => panic!("expected upload error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_publish_through_trait() {
    let publisher: &dyn Publisher = &PublishClient::log_only();
    assert!(publisher.is_log_only());
    assert_eq!(publisher.name(), "twitter");

    let receipt = publisher
        .publish("Untitled", Bytes::from_static(b"jpeg"))
        .await
        .unwrap();
    assert!(receipt.is_empty());
}
