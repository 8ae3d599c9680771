use std::net::SocketAddr;

use serde::Deserialize;

use crate::errors::RequestError;

/// Caller attributes reported by whichever verifier authenticated the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerClaims {
    pub name: Option<String>,
    pub groups: Vec<String>,
}

impl CallerClaims {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            groups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Reported identity name, with empty strings treated as absent.
    pub fn identity_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Transport-level facts about one decrypt call.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub source: Option<SocketAddr>,
    pub claims: Option<CallerClaims>,
}

impl RequestContext {
    pub fn new(source: Option<SocketAddr>, claims: Option<CallerClaims>) -> Self {
        Self { source, claims }
    }

    /// Raw identity label presented by the caller, if any.
    pub fn identity_label(&self) -> Option<&str> {
        self.claims.as_ref().and_then(CallerClaims::identity_name)
    }
}

/// Body of a decrypt call.
///
/// `encryptedData` is accepted as an alias so payloads produced against the
/// older field name keep decrypting.
#[derive(Debug, Clone, Deserialize)]
pub struct DecryptRequest {
    #[serde(alias = "encryptedData")]
    pub data: String,
}

impl DecryptRequest {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Shape check applied before any identity handling.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.data.is_empty() {
            return Err(RequestError::EmptyPayload);
        }
        Ok(())
    }
}
