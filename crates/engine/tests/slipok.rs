use std::time::Duration;

use httpmock::{Method::POST, MockServer};
use serde_json::json;

use engine::{EngineError, SlipOkConfig, SlipOkVerifier, SlipVerifier, StoredFile};

async fn stored_slip(dir: &tempfile::TempDir) -> StoredFile {
    let path = dir.path().join("slip.jpg");
    tokio::fs::write(&path, b"jpeg-bytes").await.unwrap();
    StoredFile {
        reference: "/uploads/slip.jpg".to_string(),
        path,
        size: 10,
    }
}

fn verifier(server: &MockServer, timeout: Duration) -> SlipOkVerifier {
    SlipOkVerifier::new(
        SlipOkConfig::new("secret", "4242")
            .base_url(server.url("/api/line/apikey"))
            .timeout(timeout),
    )
    .unwrap()
}

#[tokio::test]
async fn accepted_slip_returns_data_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/line/apikey/4242")
                .header("x-authorization", "secret")
                .body_includes("name=\"files\"")
                .body_includes("jpeg-bytes");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    json!({
                        "success": true,
                        "data": {"success": true, "transRef": "016", "amount": 100}
                    })
                    .to_string(),
                );
        })
        .await;
    let dir = tempfile::tempdir().unwrap();

    let verdict = verifier(&server, Duration::from_secs(5))
        .verify(&stored_slip(&dir).await)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(verdict.accepted);
    assert_eq!(verdict.payload, json!({"success": true, "transRef": "016", "amount": 100}));
}

#[tokio::test]
async fn negative_verdict_is_not_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/line/apikey/4242");
            then.status(200)
                .header("content-type", "application/json")
                .body(json!({"success": true, "data": {"success": false}}).to_string());
        })
        .await;
    let dir = tempfile::tempdir().unwrap();

    let verdict = verifier(&server, Duration::from_secs(5))
        .verify(&stored_slip(&dir).await)
        .await
        .unwrap();

    assert!(!verdict.accepted);
}

#[tokio::test]
async fn error_status_is_upstream_degraded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/line/apikey/4242");
            then.status(400)
                .body(json!({"code": 1012, "message": "duplicate slip"}).to_string());
        })
        .await;
    let dir = tempfile::tempdir().unwrap();

    let err = verifier(&server, Duration::from_secs(5))
        .verify(&stored_slip(&dir).await)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::UpstreamDegraded(_)));
}

#[tokio::test]
async fn slow_verifier_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/line/apikey/4242");
            then.status(200)
                .delay(Duration::from_millis(500))
                .body(json!({"success": true, "data": {"success": true}}).to_string());
        })
        .await;
    let dir = tempfile::tempdir().unwrap();

    let err = verifier(&server, Duration::from_millis(50))
        .verify(&stored_slip(&dir).await)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::UpstreamDegraded(_)));
}

#[tokio::test]
async fn missing_file_is_upstream_degraded() {
    let server = MockServer::start_async().await;
    let err = verifier(&server, Duration::from_secs(1))
        .verify(&StoredFile {
            reference: "/uploads/gone.jpg".to_string(),
            path: "/nonexistent/gone.jpg".into(),
            size: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UpstreamDegraded(_)));
}
