use axum::body::Body;
use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
#[path = "support/mod.rs"]
mod support;

use serde_json::json;
use support::{HUMAN_TOKEN, WORKLOAD_LABEL, WORKLOAD_TOKEN, bootstrap_state, decrypt_request};
use tower::ServiceExt;
use unseal_core::AuditKind;

#[tokio::test]
async fn decrypt_returns_plaintext_for_an_authorized_workload() {
    let harness = bootstrap_state();

    let request = decrypt_request(Some(WORKLOAD_TOKEN), json!({ "data": "ABC123" }));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if status != StatusCode::OK {
        panic!(
            "unexpected status: {} {}",
            status,
            String::from_utf8_lossy(&body)
        );
    }

    assert_eq!(&body[..], b"secret-value");
    assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
    assert_eq!(
        harness.audit.kinds(),
        vec![AuditKind::Started, AuditKind::Succeeded]
    );
    assert_eq!(harness.audit.records()[0].identity.as_deref(), Some("my-app"));
}

#[tokio::test]
async fn decrypt_accepts_the_legacy_field_name() {
    let harness = bootstrap_state();

    let request = decrypt_request(Some(WORKLOAD_TOKEN), json!({ "encryptedData": "ABC123" }));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn decrypt_without_a_token_is_forbidden() {
    let harness = bootstrap_state();

    let request = decrypt_request(None, json!({ "data": "ABC123" }));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(harness.audit.kinds(), vec![AuditKind::Unauthorized]);
    assert_eq!(harness.audit.records()[0].identity, None);
}

#[tokio::test]
async fn decrypt_rejects_human_identities() {
    let harness = bootstrap_state();

    let request = decrypt_request(Some(HUMAN_TOKEN), json!({ "data": "ABC123" }));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(harness.audit.kinds(), vec![AuditKind::Unauthorized]);
    assert_eq!(
        harness.audit.records()[0].identity.as_deref(),
        Some("alice@example.com")
    );
}

#[tokio::test]
async fn decrypt_rejects_unknown_tokens_before_the_gateway() {
    let harness = bootstrap_state();

    let request = decrypt_request(Some("bogus-token"), json!({ "data": "ABC123" }));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(harness.audit.is_empty());
}

#[tokio::test]
async fn empty_payloads_are_bad_requests_even_without_a_token() {
    let harness = bootstrap_state();

    let request = decrypt_request(None, json!({ "data": "" }));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.audit.kinds(), vec![AuditKind::BadRequest]);
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let harness = bootstrap_state();

    let request = decrypt_request(Some(WORKLOAD_TOKEN), json!({}));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.audit.kinds(), vec![AuditKind::BadRequest]);
}

#[tokio::test]
async fn failed_decryption_reads_as_a_bad_request() {
    let harness = bootstrap_state();

    let request = decrypt_request(Some(WORKLOAD_TOKEN), json!({ "data": "WRONG" }));
    let response = harness.app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "bad_request");

    assert_eq!(
        harness.audit.kinds(),
        vec![AuditKind::Started, AuditKind::Failed]
    );
    assert_eq!(
        harness.audit.records()[1].identity.as_deref(),
        Some(WORKLOAD_LABEL)
    );
}

#[tokio::test]
async fn responses_echo_the_correlation_header() {
    let harness = bootstrap_state();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/decrypt")
        .header("content-type", "application/json")
        .header("x-correlation-id", "test-correlation")
        .body(Body::from(json!({ "data": "ABC123" }).to_string()))
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("x-correlation-id")
            .and_then(|value| value.to_str().ok()),
        Some("test-correlation")
    );
}

#[tokio::test]
async fn health_check_needs_no_credentials() {
    let harness = bootstrap_state();

    let request = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(harness.audit.is_empty());
}
