use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use unseal_core::{KeyManagement, MemoryKeyManagement};

use crate::auth::{IdentityVerifier, StaticTokenVerifier};

pub struct GatewayComponents {
    pub kms: Arc<dyn KeyManagement>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

pub async fn load_gateway_components() -> Result<GatewayComponents> {
    let kms = load_kms()?;
    let verifier = load_verifier().await?;
    Ok(GatewayComponents { kms, verifier })
}

fn load_kms() -> Result<Arc<dyn KeyManagement>> {
    let backend_kind = std::env::var("KMS_BACKEND").unwrap_or_else(|_| "dev".into());
    match backend_kind.as_str() {
        "dev" => {
            let kms = MemoryKeyManagement::from_env()
                .context("failed to configure development key management")?;
            Ok(Arc::new(kms))
        }
        other => Err(anyhow!("unsupported key management backend `{other}`")),
    }
}

async fn load_verifier() -> Result<Arc<dyn IdentityVerifier>> {
    let verifier_kind = std::env::var("IDENTITY_VERIFIER").unwrap_or_else(|_| "static".into());
    match verifier_kind.as_str() {
        "static" => {
            let verifier = StaticTokenVerifier::from_env()
                .context("failed to configure static token verifier")?;
            Ok(Arc::new(verifier))
        }
        "k8s" => {
            #[cfg(feature = "k8s")]
            {
                let verifier = crate::auth::k8s::TokenReviewVerifier::from_env()
                    .await
                    .context("failed to configure token review verifier")?;
                Ok(Arc::new(verifier))
            }

            #[cfg(not(feature = "k8s"))]
            {
                anyhow::bail!("k8s verifier requested but k8s feature is not enabled");
            }
        }
        other => Err(anyhow!("unsupported identity verifier `{other}`")),
    }
}
