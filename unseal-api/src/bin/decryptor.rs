use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use reqwest::Client;
use serde_json::{Value, json};

const SECURE_PREFIX: &str = "secure:";
const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

#[derive(Parser)]
#[command(
    name = "decryptor",
    version,
    about = "Replace secure-prefixed values in a JSON document with decrypted plaintext"
)]
struct DecryptorArgs {
    /// Input JSON document
    source: PathBuf,
    /// Output path for the decrypted document
    target: PathBuf,
    /// Decrypt gateway base URL
    #[arg(long)]
    endpoint: String,
    /// Bearer token file presented to the gateway
    #[arg(long, default_value = DEFAULT_TOKEN_PATH)]
    token_path: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(err) = real_main().await {
        eprintln!("decryptor exited with error: {err:#}");
        process::exit(1);
    }
}

async fn real_main() -> Result<()> {
    let args = DecryptorArgs::parse();

    let raw = std::fs::read(&args.source)
        .with_context(|| format!("failed to read {}", args.source.display()))?;
    let mut document: Value = serde_json::from_slice(&raw).context("source is not valid JSON")?;

    let token = std::fs::read_to_string(&args.token_path)
        .with_context(|| format!("failed to read token from {}", args.token_path.display()))?;
    let client = DecryptClient::new(&args.endpoint, token.trim().to_string())?;

    let mut targets = Vec::new();
    collect_targets(&document, String::new(), &mut targets);

    for (pointer, ciphertext) in targets {
        let plaintext = client.decrypt(&ciphertext).await?;
        if let Some(slot) = document.pointer_mut(&pointer) {
            *slot = Value::String(plaintext);
        }
    }

    let rendered = serde_json::to_vec_pretty(&document)?;
    std::fs::write(&args.target, rendered)
        .with_context(|| format!("failed to write {}", args.target.display()))?;
    Ok(())
}

struct DecryptClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl DecryptClient {
    fn new(endpoint: &str, token: String) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let url = format!("{endpoint}/api/v1/decrypt", endpoint = self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "data": ciphertext }))
            .send()
            .await
            .context("decrypt request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("gateway did not indicate success: {status}");
        }
        response
            .text()
            .await
            .context("failed to read gateway response")
    }
}

/// Collects a JSON pointer for every string value carrying the secure
/// prefix, paired with the ciphertext that follows it.
fn collect_targets(value: &Value, pointer: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::String(text) => {
            if let Some(ciphertext) = text.strip_prefix(SECURE_PREFIX) {
                out.push((pointer, ciphertext.to_string()));
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                let child_pointer = format!("{pointer}/{}", escape_pointer(key));
                collect_targets(child, child_pointer, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_targets(child, format!("{pointer}/{index}"), out);
            }
        }
        _ => {}
    }
}

/// RFC 6901 pointer escaping.
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_only_secure_prefixed_strings() {
        let document = json!({
            "name": "my-app",
            "apiKey": "secure:ABC123",
            "nested": { "password": "secure:DEF456", "port": 8080 },
            "list": ["plain", "secure:GHI789"]
        });

        let mut targets = Vec::new();
        collect_targets(&document, String::new(), &mut targets);
        targets.sort();

        assert_eq!(
            targets,
            vec![
                ("/apiKey".to_string(), "ABC123".to_string()),
                ("/list/1".to_string(), "GHI789".to_string()),
                ("/nested/password".to_string(), "DEF456".to_string()),
            ]
        );
    }

    #[test]
    fn ciphertext_keeps_separators_after_the_prefix() {
        let document = json!({ "value": "secure:AB:CD/EF" });

        let mut targets = Vec::new();
        collect_targets(&document, String::new(), &mut targets);

        assert_eq!(
            targets,
            vec![("/value".to_string(), "AB:CD/EF".to_string())]
        );
    }

    #[test]
    fn pointers_survive_special_characters_in_keys() {
        let document = json!({ "a/b": { "c~d": "secure:XYZ" } });

        let mut targets = Vec::new();
        collect_targets(&document, String::new(), &mut targets);

        assert_eq!(targets.len(), 1);
        let (pointer, ciphertext) = &targets[0];
        assert_eq!(ciphertext, "XYZ");

        let mut patched = document.clone();
        *patched.pointer_mut(pointer).unwrap() = Value::String("plain".into());
        assert_eq!(patched["a/b"]["c~d"], "plain");
    }
}
