use thiserror::Error;

pub type KmsResult<T> = std::result::Result<T, KmsError>;

/// Reasons a caller label could not be read as a workload identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity does not carry the service account prefix")]
    NotAWorkloadIdentity,
    #[error("service account identity is missing namespace or account name")]
    MalformedIdentity,
}

/// Shape problems detected before any identity handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request body could not be read: {0}")]
    Malformed(String),
    #[error("one or more required fields are missing from the request body")]
    EmptyPayload,
}

/// Failures reported by a key management backend.
///
/// `DecryptionFailure` is the expected per-request failure and becomes an
/// outcome; every other variant is an infrastructure fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KmsError {
    #[error("decryption failed: {0}")]
    DecryptionFailure(String),
    #[error("key management provider error: {0}")]
    Provider(String),
}
