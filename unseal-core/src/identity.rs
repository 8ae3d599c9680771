use std::fmt;
use std::str::FromStr;

use crate::errors::IdentityError;

/// Username prefix Kubernetes assigns to service account tokens.
pub const SERVICE_ACCOUNT_PREFIX: &str = "system:serviceaccount:";

/// A caller identity of the form `system:serviceaccount:<namespace>:<name>`.
///
/// The namespace ends at the first separator after the prefix; everything
/// beyond it belongs to the account name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadIdentity {
    namespace: String,
    account_name: String,
}

impl WorkloadIdentity {
    pub fn parse(label: &str) -> Result<Self, IdentityError> {
        let rest = label
            .strip_prefix(SERVICE_ACCOUNT_PREFIX)
            .ok_or(IdentityError::NotAWorkloadIdentity)?;
        let (namespace, account_name) = rest
            .split_once(':')
            .ok_or(IdentityError::MalformedIdentity)?;
        if namespace.is_empty() || account_name.is_empty() {
            return Err(IdentityError::MalformedIdentity);
        }
        Ok(Self {
            namespace: namespace.to_string(),
            account_name: account_name.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Key under which this workload's material lives in the KMS.
    ///
    /// Always the account name, nothing else; changing this silently breaks
    /// every secret already encrypted for the workload.
    pub fn key_identifier(&self) -> KeyIdentifier {
        KeyIdentifier(self.account_name.clone())
    }
}

impl fmt::Display for WorkloadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SERVICE_ACCOUNT_PREFIX}{namespace}:{name}",
            namespace = self.namespace,
            name = self.account_name
        )
    }
}

impl FromStr for WorkloadIdentity {
    type Err = IdentityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Name of a decryption key held by the key management backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyIdentifier(String);

impl KeyIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<KeyIdentifier> for String {
    fn from(value: KeyIdentifier) -> Self {
        value.0
    }
}
