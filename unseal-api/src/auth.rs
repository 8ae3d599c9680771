use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use unseal_core::{CallerClaims, RequestContext};

use crate::error::AppError;
use crate::state::AppState;

/// Maps a bearer token onto the caller attributes it certifies.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the claims it carries.
    ///
    /// Rejected tokens surface as `AppError::unauthorized`; faults while
    /// talking to an external verifier surface as `AppError::internal`.
    async fn verify(&self, token: &str) -> Result<CallerClaims, AppError>;
}

pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix("Bearer ") {
        Some(rest.trim())
    } else if let Some(rest) = value.strip_prefix("bearer ") {
        Some(rest.trim())
    } else {
        None
    }
}

/// Establishes who is calling before the handler runs.
///
/// A missing credential is still a routable request: the policy downstream
/// turns the absent identity into its uniform denial. Only a credential
/// that is present but rejected stops the request here.
pub async fn verify_layer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_owned);

    let claims = match token {
        Some(token) => match state.verifier.verify(&token).await {
            Ok(claims) => Some(claims),
            Err(err) => return err.into_response(),
        },
        None => None,
    };

    let source = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    req.extensions_mut()
        .insert(RequestContext::new(source, claims));
    next.run(req).await
}

pub const TOKENS_PATH_ENV: &str = "AUTH_STATIC_TOKENS_PATH";

/// Token table for development and tests: opaque bearer tokens mapped to
/// the identity names they certify.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, CallerClaims>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, claims: CallerClaims) {
        self.tokens.insert(token.into(), claims);
    }

    /// Loads the table from `AUTH_STATIC_TOKENS_PATH` when set, otherwise
    /// starts empty and rejects every token.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(TOKENS_PATH_ENV) {
            Ok(path) => Self::from_seed_file(Path::new(&path)),
            Err(_) => Ok(Self::new()),
        }
    }

    /// Seed file format: a JSON object of token to identity name.
    pub fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read token table {}", path.display()))?;
        let table: HashMap<String, String> =
            serde_json::from_slice(&raw).context("failed to parse token table")?;

        let mut verifier = Self::new();
        for (token, name) in table {
            verifier.insert(token, CallerClaims::named(name));
        }
        Ok(verifier)
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<CallerClaims, AppError> {
        self.tokens
            .get(token.trim())
            .cloned()
            .ok_or_else(|| AppError::unauthorized("token validation error"))
    }
}

#[cfg(feature = "k8s")]
pub mod k8s {
    use async_trait::async_trait;
    use k8s_openapi::api::authentication::v1::{TokenReview, TokenReviewSpec, TokenReviewStatus};
    use kube::Client;
    use kube::api::{Api, PostParams};

    use unseal_core::CallerClaims;

    use super::IdentityVerifier;
    use crate::error::AppError;

    /// Delegates token verification to the cluster's TokenReview API.
    #[derive(Clone)]
    pub struct TokenReviewVerifier {
        client: Client,
    }

    impl TokenReviewVerifier {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        pub async fn from_env() -> anyhow::Result<Self> {
            let client = Client::try_default().await?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl IdentityVerifier for TokenReviewVerifier {
        async fn verify(&self, token: &str) -> Result<CallerClaims, AppError> {
            let api: Api<TokenReview> = Api::all(self.client.clone());
            let review = TokenReview {
                spec: TokenReviewSpec {
                    token: Some(token.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            let reviewed = api
                .create(&PostParams::default(), &review)
                .await
                .map_err(|err| AppError::internal(format!("token review failed: {err}")))?;
            claims_from_status(reviewed.status)
        }
    }

    /// Maps a TokenReview verdict onto caller claims.
    pub fn claims_from_status(status: Option<TokenReviewStatus>) -> Result<CallerClaims, AppError> {
        let status = status.ok_or_else(|| AppError::unauthorized("token validation error"))?;
        if let Some(error) = status.error.filter(|error| !error.is_empty()) {
            return Err(AppError::unauthorized(error));
        }
        if status.authenticated != Some(true) {
            return Err(AppError::unauthorized("token validation error"));
        }

        let user = status.user.unwrap_or_default();
        Ok(CallerClaims {
            name: user.username,
            groups: user.groups.unwrap_or_default(),
        })
    }

}
