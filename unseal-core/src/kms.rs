use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::errors::{KmsError, KmsResult};
use crate::identity::KeyIdentifier;

/// Asynchronous decryption backend keyed by per-workload key identifiers.
#[async_trait]
pub trait KeyManagement: Send + Sync {
    /// Decrypt `ciphertext` under the key named by `key`.
    async fn decrypt(&self, key: &KeyIdentifier, ciphertext: &str) -> KmsResult<Vec<u8>>;
}

#[async_trait]
impl<T> KeyManagement for Arc<T>
where
    T: KeyManagement + ?Sized,
{
    async fn decrypt(&self, key: &KeyIdentifier, ciphertext: &str) -> KmsResult<Vec<u8>> {
        (**self).decrypt(key, ciphertext).await
    }
}

#[async_trait]
impl<T> KeyManagement for Box<T>
where
    T: KeyManagement + ?Sized,
{
    async fn decrypt(&self, key: &KeyIdentifier, ciphertext: &str) -> KmsResult<Vec<u8>> {
        (**self).decrypt(key, ciphertext).await
    }
}

pub const SEED_PATH_ENV: &str = "UNSEAL_DEV_KEYS_PATH";

#[derive(Debug, Deserialize)]
struct SeedEntry {
    key: String,
    ciphertext: String,
    /// Base64-encoded plaintext.
    plaintext: String,
}

/// In-memory key management for development and tests.
///
/// Holds a table of decryptable entries; decrypt succeeds only for
/// ciphertext seeded under the same key identifier.
#[derive(Debug, Default)]
pub struct MemoryKeyManagement {
    entries: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryKeyManagement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads seed material from `UNSEAL_DEV_KEYS_PATH` when set, otherwise
    /// starts empty.
    pub fn from_env() -> KmsResult<Self> {
        match std::env::var(SEED_PATH_ENV) {
            Ok(path) => Self::from_seed_file(Path::new(&path)),
            Err(_) => Ok(Self::new()),
        }
    }

    /// Loads a JSON array of `{key, ciphertext, plaintext}` entries where
    /// plaintext is base64.
    pub fn from_seed_file(path: &Path) -> KmsResult<Self> {
        let raw = std::fs::read(path)
            .map_err(|err| KmsError::Provider(format!("failed to read seed file: {err}")))?;
        let seeds: Vec<SeedEntry> = serde_json::from_slice(&raw)
            .map_err(|err| KmsError::Provider(format!("failed to parse seed file: {err}")))?;

        let kms = Self::new();
        for seed in seeds {
            let plaintext = STANDARD
                .decode(seed.plaintext.as_bytes())
                .map_err(|err| KmsError::Provider(format!("invalid seed plaintext: {err}")))?;
            kms.insert(&seed.key, &seed.ciphertext, plaintext);
        }
        Ok(kms)
    }

    /// Registers a decryptable entry.
    pub fn insert(&self, key: &str, ciphertext: &str, plaintext: impl Into<Vec<u8>>) {
        self.entries
            .write()
            .insert((key.to_string(), ciphertext.to_string()), plaintext.into());
    }
}

#[async_trait]
impl KeyManagement for MemoryKeyManagement {
    async fn decrypt(&self, key: &KeyIdentifier, ciphertext: &str) -> KmsResult<Vec<u8>> {
        self.entries
            .read()
            .get(&(key.as_str().to_string(), ciphertext.to_string()))
            .cloned()
            .ok_or_else(|| {
                KmsError::DecryptionFailure(format!("no decryptable entry under key {key}"))
            })
    }
}
