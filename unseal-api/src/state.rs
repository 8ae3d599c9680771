use std::sync::Arc;

use unseal_core::DecryptGateway;

use crate::auth::IdentityVerifier;

pub type SharedGateway = Arc<DecryptGateway>;
pub type SharedVerifier = Arc<dyn IdentityVerifier>;

#[derive(Clone)]
pub struct AppState {
    pub gateway: SharedGateway,
    pub verifier: SharedVerifier,
}

impl AppState {
    pub fn new(gateway: SharedGateway, verifier: SharedVerifier) -> Self {
        Self { gateway, verifier }
    }
}
