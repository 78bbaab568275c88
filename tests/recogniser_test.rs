//! Wiremock integration tests for RecognitionClient.

use std::time::Duration;

use bytes::Bytes;
use tweeter::RecognitionError;
use tweeter::providers::{RecognitionClient, Recogniser};
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn client(server: &MockServer) -> RecognitionClient {
    let endpoint = format!("{}/recognize", server.uri());
    let client = RecognitionClient::new(endpoint.clone(), TIMEOUT).expect("client should build");
    assert_eq!(client.endpoint(), endpoint);
    client
}

/// Labels come back in backend order, not re-sorted by probability.
#[tokio::test]
async fn test_classify_success_preserves_order() {
    let mock_server = MockServer::start().await;

    let body = serde_json::json!({
        "filename": "Untitled.jpg",
        "labels": [
            { "label": "snow", "probability": 0.4 },
            { "label": "polar bear", "probability": 0.9 },
            { "label": "ice", "probability": 0.2 }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"image\"; filename=\"Untitled.jpg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .classify(Bytes::from_static(b"not really a jpeg"))
        .await
        .expect("classify should succeed");

    let texts: Vec<&str> = result.labels().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["snow", "polar bear", "ice"]);
    assert!((result.labels()[1].probability - 0.9).abs() < 0.001);
    assert_eq!(result.filename(), Some("Untitled.jpg"));
}

#[tokio::test]
async fn test_classify_empty_labels() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "labels": [] })),
        )
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).classify(Bytes::from_static(b"img")).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.filename(), None);
}

#[tokio::test]
async fn test_classify_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).classify(Bytes::from_static(b"img")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Status(500)), "got {err:?}");
}

/// Only a 200 counts as success.
#[tokio::test]
async fn test_classify_non_200_success_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "labels": [] })),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).classify(Bytes::from_static(b"img")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Status(201)), "got {err:?}");
}

#[tokio::test]
async fn test_classify_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).classify(Bytes::from_static(b"img")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_classify_missing_labels_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "filename": "Untitled.jpg" })),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).classify(Bytes::from_static(b"img")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_classify_unreachable() {
    // Grab a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RecognitionClient::new(format!("http://{addr}/recognize"), TIMEOUT).unwrap();
    let err = client.classify(Bytes::from_static(b"img")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_classify_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "labels": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = RecognitionClient::new(
        format!("{}/recognize", mock_server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();
    let err = client.classify(Bytes::from_static(b"img")).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Transport(_)), "got {err:?}");
}

/// The trait seam forwards to the inherent method.
#[tokio::test]
async fn test_classify_through_trait() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "labels": [{ "label": "cat", "probability": 0.8 }]
        })))
        .mount(&mock_server)
        .await;

    let recogniser: &dyn Recogniser = &client(&mock_server);
    let result = recogniser
        .classify(Bytes::from_static(b"img"))
        .await
        .unwrap();
    assert_eq!(result.labels()[0].text, "cat");
    assert_eq!(recogniser.name(), "recogniser");
}
