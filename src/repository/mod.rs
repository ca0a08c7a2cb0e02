pub mod alloy;
pub mod contract;
pub mod error;

use ::alloy::primitives::{Address, Bytes, TxHash, U256};
pub use alloy::{AlloyChainClient, TokenBalance, TxReceiptInfo};
use async_trait::async_trait;
pub use error::ChainError;

pub(crate) type ChainResult<T> = std::result::Result<T, ChainError>;

/// Blockchain node access: read-only queries, signed transaction broadcast,
/// and receipt polling.
///
/// Implementations bind a single signer; every `send_transaction` goes out
/// from that account. Reads carry no retry policy of their own; a failed
/// read surfaces to the caller unchanged.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the bound signer.
    fn signer_address(&self) -> Address;

    async fn get_chain_id(&self) -> ChainResult<u64>;

    /// Native balance in wei.
    async fn get_eth_balance(&self, address: Address) -> ChainResult<U256>;

    /// ERC20 balance plus the metadata needed to report it.
    async fn get_erc20_balance(&self, token: Address, owner: Address) -> ChainResult<TokenBalance>;

    /// Whether code exists at `address`.
    async fn is_deployed(&self, address: Address) -> ChainResult<bool>;

    /// Current sqrt price (X96 fixed point) and tick from a Uniswap V3
    /// pool's slot0.
    async fn get_pool_slot0(&self, pool: Address) -> ChainResult<(U256, i32)>;

    /// In-range liquidity of a Uniswap V3 pool.
    async fn get_pool_liquidity(&self, pool: Address) -> ChainResult<u128>;

    /// Signs and broadcasts a transaction, returning once the node has
    /// accepted it into the pending pool. Does not wait for inclusion.
    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> ChainResult<TxHash>;

    /// Polls for the receipt of `tx_hash` within the configured bound.
    ///
    /// A reverted transaction is NOT an error here: the receipt is returned
    /// with `success == false` and the caller decides what that means.
    /// Exceeding the bound yields [`ChainError::ConfirmationTimeout`].
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceiptInfo>;
}
