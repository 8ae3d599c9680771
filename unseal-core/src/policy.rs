use crate::identity::WorkloadIdentity;
use crate::types::CallerClaims;

/// Verdict over one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Authorized(WorkloadIdentity),
    Denied,
}

/// Admits exactly the callers that present a parseable service account
/// identity.
///
/// Every failure mode collapses into the same `Denied` value, so a probing
/// caller cannot tell a missing credential from a malformed one.
pub fn authorize(claims: Option<&CallerClaims>) -> Decision {
    let Some(name) = claims.and_then(CallerClaims::identity_name) else {
        return Decision::Denied;
    };
    match WorkloadIdentity::parse(name) {
        Ok(identity) => Decision::Authorized(identity),
        Err(_) => Decision::Denied,
    }
}
