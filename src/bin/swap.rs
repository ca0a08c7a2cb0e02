//! Executes the wrap -> approve -> swap batch through the deployed smart
//! wallet as a single atomic transaction.

use std::time::Duration;

use alloy::primitives::{Address, address};
use anyhow::Context;
use safe_batch_swap::config::Config;
use safe_batch_swap::repository::alloy::connect_http;
use safe_batch_swap::service::SmartWalletOrchestrator;
use safe_batch_swap::service::trade::TradeRoute;
use safe_batch_swap::service::types::SlippageTolerance;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// Ethereum mainnet.
const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
const USDC_WETH_POOL: Address = address!("0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640");
const SWAP_ROUTER: Address = address!("0xE592427A0AEce92De3Edee1F18E0157C05861564");
const POOL_FEE_PIPS: u32 = 3000;

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

    let wallet = config.wallet_address()?;
    let amount_in = config.amount_in_wei()?;
    let slippage = SlippageTolerance::bps(config.trade.slippage_bps);
    let deadline_offset_secs = config.trade.deadline_secs;

    let route = TradeRoute {
        token_in: WETH,
        token_out: USDC,
        fee_pips: POOL_FEE_PIPS,
        pool: USDC_WETH_POOL,
        router: SWAP_ROUTER,
    };

    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));
    let result = orchestrator
        .run_swap(wallet, route, amount_in, slippage, deadline_offset_secs)
        .await
        .context("swap flow failed")?;

    tracing::info!(
        "Swap flow complete: tx {} confirmed in block {:?} (gas used {})",
        result.tx_hash,
        result.block_number,
        result.gas_used
    );

    Ok(())
}
