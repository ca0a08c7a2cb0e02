//! Deploys and funds the smart wallet. Run once per owner set and salt;
//! repeating the run is harmless (the deploy step becomes a no-op).

use std::time::Duration;

use anyhow::Context;
use safe_batch_swap::config::Config;
use safe_batch_swap::repository::alloy::connect_http;
use safe_batch_swap::service::SmartWalletOrchestrator;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,alloy=warn".into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let config = Config::from_yaml("config/default.yaml").context("failed to load configuration")?;

    let chain = connect_http(
        &config.rpc.url,
        &config.signer.private_key,
        Duration::from_secs(config.rpc.receipt_timeout_secs),
        Duration::from_millis(config.rpc.receipt_poll_ms),
    )
    .context("failed to connect to RPC endpoint")?;

    let owners = config.owners()?;
    let funding_wei = config.funding_wei()?;
    let salt_nonce = config.wallet.salt_nonce;

    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));
    let result = orchestrator
        .run_deployment(owners, 1, salt_nonce, funding_wei)
        .await
        .context("deployment flow failed")?;

    tracing::info!(
        "Deployment flow complete: tx {} confirmed in block {:?}",
        result.tx_hash,
        result.block_number
    );

    Ok(())
}
