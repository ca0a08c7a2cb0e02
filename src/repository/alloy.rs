use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::instrument;

use super::error::ChainError;
use crate::repository::contract::{IERC20, IUniswapV3Pool};
use crate::repository::{ChainClient, ChainResult};

#[derive(Debug, Clone)]
pub struct TokenBalance {
    pub balance: U256,
    pub decimals: u8,
    pub symbol: String,
}

/// Receipt metadata surfaced to the orchestration layer. `success` is the
/// on-chain execution status; a reverted transaction still yields a receipt.
#[derive(Debug, Clone)]
pub struct TxReceiptInfo {
    pub tx_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

pub struct AlloyChainClient<P> {
    provider: Arc<P>,
    signer_address: Address,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl<P: Provider + Clone + 'static> AlloyChainClient<P> {
    pub fn new(
        provider: Arc<P>,
        signer_address: Address,
        receipt_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            provider,
            signer_address,
            receipt_timeout,
            poll_interval,
        }
    }
}

/// Builds a signer-bound HTTP client. The private key is parsed and wrapped
/// into the provider's filler stack, so every broadcast goes out signed.
pub fn connect_http(
    rpc_url: &str,
    private_key: &str,
    receipt_timeout: Duration,
    poll_interval: Duration,
) -> Result<AlloyChainClient<impl Provider + Clone + 'static + use<>>, ChainError> {
    let signer = PrivateKeySigner::from_str(private_key)
        .map_err(|e| ChainError::ParseError(format!("Invalid private key: {e}")))?;
    let signer_address = signer.address();

    let url = rpc_url
        .parse()
        .map_err(|e| ChainError::ParseError(format!("Invalid RPC URL: {e}")))?;

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url);

    Ok(AlloyChainClient::new(
        Arc::new(provider),
        signer_address,
        receipt_timeout,
        poll_interval,
    ))
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> ChainClient for AlloyChainClient<P> {
    fn signer_address(&self) -> Address {
        self.signer_address
    }

    #[instrument(skip(self), err)]
    async fn get_chain_id(&self) -> ChainResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn get_eth_balance(&self, address: Address) -> ChainResult<U256> {
        self.provider.get_balance(address).await.map_err(|e| {
            if e.to_string().contains("429") {
                tracing::warn!("Rate limited while getting ETH balance for {}", address);
            }
            ChainError::RpcError(e.to_string())
        })
    }

    #[instrument(skip(self), err)]
    async fn get_erc20_balance(&self, token: Address, owner: Address) -> ChainResult<TokenBalance> {
        let contract = IERC20::new(token, self.provider.clone());

        let balance = contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;

        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;

        let symbol = contract
            .symbol()
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;

        Ok(TokenBalance {
            balance,
            decimals,
            symbol,
        })
    }

    #[instrument(skip(self), err)]
    async fn is_deployed(&self, address: Address) -> ChainResult<bool> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;
        Ok(!code.is_empty())
    }

    #[instrument(skip(self), err)]
    async fn get_pool_slot0(&self, pool: Address) -> ChainResult<(U256, i32)> {
        let contract = IUniswapV3Pool::new(pool, self.provider.clone());

        let slot0 = contract
            .slot0()
            .call()
            .await
            .map_err(|e| ChainError::ContractError(format!("slot0 read failed: {e}")))?;

        Ok((U256::from(slot0.sqrtPriceX96), slot0.tick.as_i32()))
    }

    #[instrument(skip(self), err)]
    async fn get_pool_liquidity(&self, pool: Address) -> ChainResult<u128> {
        let contract = IUniswapV3Pool::new(pool, self.provider.clone());

        contract
            .liquidity()
            .call()
            .await
            .map_err(|e| ChainError::ContractError(format!("liquidity read failed: {e}")))
    }

    #[instrument(skip(self, data), err)]
    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> ChainResult<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(self.signer_address)
            .with_to(to)
            .with_value(value)
            .with_input(data);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::BroadcastError(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        tracing::debug!("Broadcast accepted: {tx_hash}");

        Ok(tx_hash)
    }

    #[instrument(skip(self), err)]
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceiptInfo> {
        let started = std::time::Instant::now();

        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| ChainError::RpcError(e.to_string()))?;

            if let Some(receipt) = receipt {
                return Ok(TxReceiptInfo {
                    tx_hash,
                    success: receipt.status(),
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used,
                });
            }

            if started.elapsed() >= self.receipt_timeout {
                return Err(ChainError::ConfirmationTimeout {
                    tx_hash,
                    timeout_secs: self.receipt_timeout.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RPC_URL: &str = "https://eth.llamarpc.com";

    // Well-known anvil test key. DO NOT use with real funds.
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    // USDC/WETH 0.3% pool on Ethereum mainnet
    const USDC_WETH_POOL: &str = "0x8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8";

    fn create_test_client() -> AlloyChainClient<impl Provider + Clone + 'static> {
        let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| RPC_URL.to_string());
        connect_http(
            &rpc_url,
            TEST_PRIVATE_KEY,
            Duration::from_secs(30),
            Duration::from_millis(500),
        )
        .expect("client should build")
    }

    #[test]
    fn test_connect_derives_signer_address() {
        let client = create_test_client();

        let expected = Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
            .expect("Invalid expected address");
        assert_eq!(client.signer_address(), expected);
    }

    #[test]
    fn test_connect_with_invalid_key_fails() {
        let result = connect_http(
            RPC_URL,
            "not_a_valid_private_key",
            Duration::from_secs(30),
            Duration::from_millis(500),
        );

        match result {
            Err(ChainError::ParseError(msg)) => {
                assert!(msg.contains("Invalid private key"));
            }
            Err(e) => panic!("Expected ParseError, got: {e:?}"),
            Ok(_) => panic!("Expected error for invalid private key"),
        }
    }

    #[test]
    fn test_connect_with_invalid_url_fails() {
        let result = connect_http(
            "not a url",
            TEST_PRIVATE_KEY,
            Duration::from_secs(30),
            Duration::from_millis(500),
        );
        assert!(matches!(result, Err(ChainError::ParseError(_))));
    }

    #[tokio::test]
    #[serial_test::serial]
    #[ignore = "hits a public RPC endpoint"]
    async fn test_get_pool_slot0_should_work() {
        let client = create_test_client();
        let pool = Address::from_str(USDC_WETH_POOL).expect("Invalid pool address");

        let (sqrt_price, tick) = client
            .get_pool_slot0(pool)
            .await
            .expect("slot0 read should work");

        assert!(sqrt_price > U256::ZERO, "Expected non-zero sqrt price");
        // USDC/WETH trades around tick ~200000; anything plausible is fine.
        assert!(tick != 0, "Expected non-zero tick");
    }

    #[tokio::test]
    #[serial_test::serial]
    #[ignore = "hits a public RPC endpoint"]
    async fn test_get_pool_liquidity_should_work() {
        let client = create_test_client();
        let pool = Address::from_str(USDC_WETH_POOL).expect("Invalid pool address");

        let liquidity = client
            .get_pool_liquidity(pool)
            .await
            .expect("liquidity read should work");

        assert!(liquidity > 0, "Expected active pool liquidity");
    }

    #[tokio::test]
    #[serial_test::serial]
    #[ignore = "hits a public RPC endpoint"]
    async fn test_is_deployed_distinguishes_code() {
        let client = create_test_client();

        let pool = Address::from_str(USDC_WETH_POOL).expect("Invalid pool address");
        assert!(client.is_deployed(pool).await.expect("read should work"));

        let eoa = Address::from_str("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")
            .expect("Invalid address");
        assert!(!client.is_deployed(eoa).await.expect("read should work"));
    }
}
