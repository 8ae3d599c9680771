use std::sync::Arc;

use tracing::{debug, warn};

use crate::audit::{AuditKind, AuditRecord, AuditSink};
use crate::errors::{KmsError, RequestError};
use crate::kms::KeyManagement;
use crate::policy::{self, Decision};
use crate::types::{DecryptRequest, RequestContext};

/// Outcome of one decrypt call, ready for transport mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// Plaintext recovered for an authorized workload.
    Success(Vec<u8>),
    /// Request failed shape validation before any identity handling.
    BadRequest(RequestError),
    /// Caller is not an authorized workload identity.
    Unauthorized,
    /// The backend holds no decryptable material for this workload's key.
    DecryptionFailed,
}

/// Drives a decrypt call through validation, authorization, and the
/// decryption backend, recording every decision in the audit trail.
///
/// The gateway keeps no per-request state; one instance serves concurrent
/// calls.
#[derive(Clone)]
pub struct DecryptGateway {
    kms: Arc<dyn KeyManagement>,
    audit: Arc<dyn AuditSink>,
}

impl DecryptGateway {
    pub fn new(kms: Arc<dyn KeyManagement>, audit: Arc<dyn AuditSink>) -> Self {
        Self { kms, audit }
    }

    /// Handle one decrypt call.
    ///
    /// Shape problems and failed decryption both come back as outcomes the
    /// transport maps onto the same status class, so a caller cannot use the
    /// gateway as a decryption oracle. Infrastructure faults from the
    /// backend propagate as errors instead of outcomes.
    pub async fn decrypt(
        &self,
        ctx: &RequestContext,
        request: Result<DecryptRequest, RequestError>,
    ) -> Result<DecryptOutcome, KmsError> {
        let request = match request.and_then(|request| {
            request.validate()?;
            Ok(request)
        }) {
            Ok(request) => request,
            Err(err) => {
                self.reject_bad_input(ctx, &err);
                return Ok(DecryptOutcome::BadRequest(err));
            }
        };

        let identity = match policy::authorize(ctx.claims.as_ref()) {
            Decision::Authorized(identity) => identity,
            Decision::Denied => {
                self.reject_unauthorized(ctx);
                return Ok(DecryptOutcome::Unauthorized);
            }
        };

        let key = identity.key_identifier();
        self.audit.record(
            AuditRecord::new(AuditKind::Started, "decryption request started")
                .with_source(ctx.source)
                .with_identity(key.as_str()),
        );
        debug!(key = %key, "decryption request started");

        match self.kms.decrypt(&key, &request.data).await {
            Ok(plaintext) => {
                self.audit.record(
                    AuditRecord::new(AuditKind::Succeeded, "decryption request succeeded")
                        .with_source(ctx.source)
                        .with_identity(key.as_str()),
                );
                debug!(key = %key, "decryption request succeeded");
                Ok(DecryptOutcome::Success(plaintext))
            }
            Err(KmsError::DecryptionFailure(detail)) => {
                let identity_label = ctx.identity_label().unwrap_or(key.as_str());
                self.audit.record(
                    AuditRecord::new(AuditKind::Failed, detail.clone())
                        .with_source(ctx.source)
                        .with_identity(identity_label),
                );
                warn!(
                    identity = %identity_label,
                    detail = %detail,
                    "decryption request failed"
                );
                Ok(DecryptOutcome::DecryptionFailed)
            }
            Err(err) => Err(err),
        }
    }

    fn reject_bad_input(&self, ctx: &RequestContext, err: &RequestError) {
        self.audit.record(
            AuditRecord::new(AuditKind::BadRequest, err.to_string()).with_source(ctx.source),
        );
        debug!(detail = %err, "rejected decrypt request with bad input");
    }

    fn reject_unauthorized(&self, ctx: &RequestContext) {
        let mut record = AuditRecord::new(
            AuditKind::Unauthorized,
            "caller is not an authorized workload identity",
        )
        .with_source(ctx.source);
        if let Some(label) = ctx.identity_label() {
            record = record.with_identity(label);
        }
        self.audit.record(record);
        debug!("rejected decrypt request from unauthorized caller");
    }
}
