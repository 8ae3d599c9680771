//! Core decision path for the decrypt gateway: identity parsing,
//! authorization policy, the audit trail, and the key management seam.

pub mod audit;
pub mod errors;
pub mod gateway;
pub mod identity;
pub mod kms;
pub mod policy;
pub mod types;

pub use audit::{AuditKind, AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use errors::{IdentityError, KmsError, KmsResult, RequestError};
pub use gateway::{DecryptGateway, DecryptOutcome};
pub use identity::{KeyIdentifier, SERVICE_ACCOUNT_PREFIX, WorkloadIdentity};
pub use kms::{KeyManagement, MemoryKeyManagement};
pub use policy::{Decision, authorize};
pub use types::{CallerClaims, DecryptRequest, RequestContext};
