use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, header::AUTHORIZATION};

use unseal_api::AppState;
use unseal_api::auth::StaticTokenVerifier;
use unseal_api::http;
use unseal_core::{CallerClaims, DecryptGateway, MemoryAuditSink, MemoryKeyManagement};

pub const WORKLOAD_TOKEN: &str = "workload-token";
pub const HUMAN_TOKEN: &str = "human-token";
pub const WORKLOAD_LABEL: &str = "system:serviceaccount:my-ns:my-app";

pub struct TestHarness {
    pub app: axum::Router,
    pub audit: Arc<MemoryAuditSink>,
}

pub fn bootstrap_state() -> TestHarness {
    let kms = MemoryKeyManagement::new();
    kms.insert("my-app", "ABC123", b"secret-value".to_vec());

    let audit = Arc::new(MemoryAuditSink::new());
    let gateway = DecryptGateway::new(Arc::new(kms), audit.clone());

    let mut verifier = StaticTokenVerifier::new();
    verifier.insert(WORKLOAD_TOKEN, CallerClaims::named(WORKLOAD_LABEL));
    verifier.insert(HUMAN_TOKEN, CallerClaims::named("alice@example.com"));

    let state = AppState::new(Arc::new(gateway), Arc::new(verifier));
    TestHarness {
        app: http::router(state),
        audit,
    }
}

pub fn decrypt_request(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/decrypt")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
