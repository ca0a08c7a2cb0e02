use alloy::primitives::{Address, TxHash};
use thiserror::Error;

use crate::config::ConfigError;
use crate::repository::ChainError;

#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// Missing or malformed configuration. Fatal; nothing was sent.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A node or contract read failed. Surfaced unchanged; a caller may
    /// retry the whole flow.
    #[error("Chain read error: {0}")]
    ChainRead(ChainError),

    /// Bad trade inputs (zero amount, slippage outside [0, 1), unusable
    /// pool state). Fatal until the inputs are fixed.
    #[error("Invalid trade parameters: {0}")]
    InvalidTradeParameters(String),

    /// The swap flow was invoked against an address with no code. The
    /// deployment flow must run first.
    #[error("Wallet not deployed at {0}")]
    WalletNotDeployed(Address),

    /// The deployment transaction reverted or could not be broadcast.
    /// Fatal for this attempt; retrying with the same salt is unsafe.
    #[error("Wallet deployment failed: {0}")]
    DeploymentFailed(String),

    /// The batched wallet transaction reverted or could not be broadcast.
    /// A fresh attempt must rebuild the batch from fresh pool state.
    #[error("Batch execution failed: {0}")]
    BatchExecutionFailed(String),

    /// No receipt within the configured bound. The transaction may still
    /// land; re-poll with the hash rather than resubmitting.
    #[error("Timed out waiting for confirmation of {tx_hash}")]
    ConfirmationTimeout { tx_hash: TxHash },
}

impl From<ChainError> for OrchestratorError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::ConfirmationTimeout { tx_hash, .. } => {
                OrchestratorError::ConfirmationTimeout { tx_hash }
            }
            other => OrchestratorError::ChainRead(other),
        }
    }
}
