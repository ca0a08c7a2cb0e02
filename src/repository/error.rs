use alloy::primitives::TxHash;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract call error: {0}")]
    ContractError(String),

    #[error("Broadcast error: {0}")]
    BroadcastError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No receipt observed for {tx_hash} within {timeout_secs}s")]
    ConfirmationTimeout { tx_hash: TxHash, timeout_secs: u64 },
}
