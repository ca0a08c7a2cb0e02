use std::str::FromStr;
use std::{fs, path::Path};

use alloy::primitives::{Address, U256};
use dotenv::dotenv;
use envsubst::substitute;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Missing required config value: {0}")]
    MissingValue(String),

    #[error("Invalid config value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Process configuration, sourced from a YAML file with `${VAR}` environment
/// substitution. Secrets (RPC endpoint, signer key, wallet address) come from
/// the environment or a `.env` file; everything else has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    pub signer: SignerConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub trade: TradeConfig,
}

impl Config {
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenv().ok();

        let file_content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(format!("{}: {e}", path.as_ref().display())))?;

        let env_vars: std::collections::HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| {
                key.starts_with("RPC_") || key.starts_with("SIGNER_") || key.starts_with("SAFE_")
            })
            .collect();

        let interpolated = substitute(&file_content, &env_vars)
            .map_err(|e| ConfigError::ParseError(format!("env substitution failed: {e}")))?;

        let config: Config = serde_yaml::from_str(&interpolated)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Checks the always-required values before any chain I/O. Flow-specific
    /// requirements (the wallet address for the swap flow) are checked by the
    /// typed accessors.
    fn validate(&self) -> Result<(), ConfigError> {
        require("rpc.url", &self.rpc.url)?;
        require("signer.private_key", &self.signer.private_key)?;
        Ok(())
    }

    /// The deployed wallet address, required by the swap flow.
    pub fn wallet_address(&self) -> Result<Address, ConfigError> {
        require("wallet.address", &self.wallet.address)?;
        parse_value("wallet.address", &self.wallet.address)
    }

    /// Owner set for the deployment flow. An empty list means the signer is
    /// the sole owner; the caller substitutes its own address in that case.
    pub fn owners(&self) -> Result<Vec<Address>, ConfigError> {
        self.wallet
            .owners
            .iter()
            .map(|o| parse_value("wallet.owners", o))
            .collect()
    }

    pub fn funding_wei(&self) -> Result<U256, ConfigError> {
        parse_value("wallet.funding_wei", &self.wallet.funding_wei)
    }

    pub fn amount_in_wei(&self) -> Result<U256, ConfigError> {
        parse_value("trade.amount_in_wei", &self.trade.amount_in_wei)
    }
}

fn require(key: &str, value: &str) -> Result<(), ConfigError> {
    // An unresolved `${VAR}` placeholder means the variable was absent from
    // the environment.
    if value.is_empty() || value.contains("${") {
        return Err(ConfigError::MissingValue(key.to_string()));
    }
    Ok(())
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    T::from_str(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    /// Wall-clock bound on receipt polling, in seconds.
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    /// Interval between receipt polls, in milliseconds.
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Address of the deployed wallet (swap flow only).
    #[serde(default)]
    pub address: String,
    /// Owner addresses for the deployment flow; empty means the signer.
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default = "default_salt_nonce")]
    pub salt_nonce: u64,
    /// Native amount transferred to the wallet after deployment.
    #[serde(default = "default_funding_wei")]
    pub funding_wei: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeConfig {
    /// Exact input amount for the swap, in wei of the wrapped native token.
    #[serde(default = "default_amount_in_wei")]
    pub amount_in_wei: String,
    /// Slippage tolerance numerator over 10000 (50 = 0.50%).
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    /// Deadline offset from submission time, in seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            amount_in_wei: default_amount_in_wei(),
            slippage_bps: default_slippage_bps(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

fn default_receipt_poll_ms() -> u64 {
    2000
}

fn default_salt_nonce() -> u64 {
    0
}

fn default_funding_wei() -> String {
    "1".to_string()
}

fn default_amount_in_wei() -> String {
    "100000000000".to_string()
}

fn default_slippage_bps() -> u32 {
    50
}

fn default_deadline_secs() -> u64 {
    1200
}
