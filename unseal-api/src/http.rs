use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::middleware;
use axum::response::IntoResponse;
use axum::{Extension, Json, Router, routing::get, routing::post};
use tracing::Instrument;

use unseal_core::{DecryptOutcome, DecryptRequest, RequestContext, RequestError};

use crate::auth;
use crate::error::{AppError, attach_correlation};
use crate::state::AppState;
use crate::telemetry::{CorrelationId, correlation_layer, request_span};

pub fn router(state: AppState) -> Router {
    let api = api_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        auth::verify_layer,
    ));

    Router::new()
        .route("/healthz", get(health_check))
        .merge(api)
        .layer(middleware::from_fn(correlation_layer))
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new().route("/api/v1/decrypt", post(decrypt))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn decrypt(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Extension(ctx): Extension<RequestContext>,
    body: Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("http.decrypt", &correlation.0);
    async move {
        let request = body
            .map(|Json(request)| request)
            .map_err(|rejection| RequestError::Malformed(rejection.body_text()));

        let outcome = state
            .gateway
            .decrypt(&ctx, request)
            .await
            .map_err(AppError::from)?;

        match outcome {
            DecryptOutcome::Success(plaintext) => Ok((
                StatusCode::OK,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                plaintext,
            )),
            DecryptOutcome::BadRequest(err) => Err(AppError::bad_request(err.to_string())),
            DecryptOutcome::Unauthorized => Err(AppError::forbidden(
                "caller is not an authorized workload identity",
            )),
            DecryptOutcome::DecryptionFailed => Err(AppError::bad_request(
                "unable to process decryption request",
            )),
        }
    }
    .instrument(span)
    .await
    .map_err(|err| attach_correlation(err, &correlation))
}
