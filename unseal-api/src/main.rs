use std::net::SocketAddr;
use std::process;

use clap::Parser;

#[derive(Parser)]
#[command(name = "unseal-api", version, about = "Identity-bound decryption gateway")]
struct GatewayArgs {
    /// Override bind address
    #[arg(long)]
    bind: Option<String>,
    /// Override key management backend kind
    #[arg(long)]
    kms: Option<String>,
    /// Verbose diagnostic output
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = real_main().await {
        eprintln!("gateway exited with error: {err:#}");
        process::exit(1);
    }
}

async fn real_main() -> anyhow::Result<()> {
    let args = GatewayArgs::parse();
    unseal_api::telemetry::init(args.verbose)?;

    if let Some(kms) = &args.kms {
        unsafe {
            std::env::set_var("KMS_BACKEND", kms);
        }
    }

    let bind = args
        .bind
        .clone()
        .or_else(|| std::env::var("UNSEAL__BIND_ADDRESS").ok())
        .unwrap_or_else(|| "0.0.0.0:8080".into());
    let http_addr: SocketAddr = bind
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080)));

    unseal_api::run(unseal_api::GatewayRuntimeConfig { http_addr }).await
}
