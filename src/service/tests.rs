use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes, TxHash, U256, keccak256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::repository::contract::{IMultiSend, ISafe, ISafeProxyFactory};
use crate::repository::{ChainClient, ChainError, ChainResult, TokenBalance, TxReceiptInfo};
use crate::service::error::OrchestratorError;
use crate::service::pool::PoolStateReader;
use crate::service::trade::TradeRoute;
use crate::service::types::SlippageTolerance;
use crate::service::wallet::{SmartWalletOrchestrator, predict_wallet_identity};

#[derive(Debug, Clone, Copy)]
enum ReceiptOutcome {
    Success,
    Revert,
    Timeout,
}

#[derive(Debug, Clone)]
struct SentTx {
    to: Address,
    value: U256,
    data: Bytes,
}

/// In-memory chain standing in for a node. Records every broadcast so tests
/// can assert exactly what went out and in what shape.
struct MockChainClient {
    signer: Address,
    deployed: Mutex<HashSet<Address>>,
    sent: Arc<Mutex<Vec<SentTx>>>,
    receipt_outcome: ReceiptOutcome,
    fail_chain_id: bool,
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: u128,
}

impl MockChainClient {
    fn new() -> Self {
        Self {
            signer: test_address(0x11),
            deployed: Mutex::new(HashSet::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            receipt_outcome: ReceiptOutcome::Success,
            fail_chain_id: false,
            // Price of exactly 1.0 and deep liquidity.
            sqrt_price_x96: U256::from(1u8) << 96,
            tick: 0,
            liquidity: 1_000_000_000_000_000_000u128,
        }
    }

    fn with_chain_id_failure(mut self) -> Self {
        self.fail_chain_id = true;
        self
    }

    fn with_deployed(self, address: Address) -> Self {
        self.deployed.lock().unwrap().insert(address);
        self
    }

    fn with_receipt_outcome(mut self, outcome: ReceiptOutcome) -> Self {
        self.receipt_outcome = outcome;
        self
    }

    fn sent_log(&self) -> Arc<Mutex<Vec<SentTx>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn get_chain_id(&self) -> ChainResult<u64> {
        if self.fail_chain_id {
            return Err(ChainError::RpcError("node unreachable".to_string()));
        }
        Ok(1)
    }

    async fn get_eth_balance(&self, _address: Address) -> ChainResult<U256> {
        Ok(U256::ZERO)
    }

    async fn get_erc20_balance(
        &self,
        _token: Address,
        _owner: Address,
    ) -> ChainResult<TokenBalance> {
        Ok(TokenBalance {
            balance: U256::ZERO,
            decimals: 18,
            symbol: "MOCK".to_string(),
        })
    }

    async fn is_deployed(&self, address: Address) -> ChainResult<bool> {
        Ok(self.deployed.lock().unwrap().contains(&address))
    }

    async fn get_pool_slot0(&self, _pool: Address) -> ChainResult<(U256, i32)> {
        Ok((self.sqrt_price_x96, self.tick))
    }

    async fn get_pool_liquidity(&self, _pool: Address) -> ChainResult<u128> {
        Ok(self.liquidity)
    }

    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> ChainResult<TxHash> {
        let mut sent = self.sent.lock().unwrap();
        let mut preimage = vec![sent.len() as u8];
        preimage.extend_from_slice(to.as_slice());
        preimage.extend_from_slice(&data);
        let tx_hash = TxHash::from(keccak256(preimage));
        sent.push(SentTx { to, value, data });
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> ChainResult<TxReceiptInfo> {
        match self.receipt_outcome {
            ReceiptOutcome::Success => Ok(TxReceiptInfo {
                tx_hash,
                success: true,
                block_number: Some(1),
                gas_used: 21_000,
            }),
            ReceiptOutcome::Revert => Ok(TxReceiptInfo {
                tx_hash,
                success: false,
                block_number: Some(1),
                gas_used: 21_000,
            }),
            ReceiptOutcome::Timeout => Err(ChainError::ConfirmationTimeout {
                tx_hash,
                timeout_secs: 1,
            }),
        }
    }
}

fn test_address(byte: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = byte;
    Address::from(bytes)
}

fn test_route() -> TradeRoute {
    TradeRoute {
        // token_in > token_out so the input is token1 (WETH > USDC on
        // mainnet has the same orientation).
        token_in: test_address(0xEE),
        token_out: test_address(0xAA),
        fee_pips: 3000,
        pool: test_address(0x99),
        router: test_address(0x55),
    }
}

#[tokio::test]
async fn test_pool_state_read_is_idempotent() {
    let chain = MockChainClient::new();
    let reader = PoolStateReader::new(&chain);
    let pool = test_address(0x99);

    // No chain state change between the two reads, so the states match.
    let first = reader.read(pool).await.expect("first read succeeds");
    let second = reader.read(pool).await.expect("second read succeeds");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_chain_id_read_failure_sends_nothing() {
    let wallet = test_address(0x42);
    let chain = MockChainClient::new()
        .with_deployed(wallet)
        .with_chain_id_failure();
    let sent = chain.sent_log();
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let result = orchestrator
        .run_swap(
            wallet,
            test_route(),
            U256::from(100_000_000_000u64),
            SlippageTolerance::bps(50),
            1200,
        )
        .await;

    assert!(matches!(result, Err(OrchestratorError::ChainRead(_))));
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_swap_against_undeployed_wallet_sends_nothing() {
    let chain = MockChainClient::new();
    let sent = chain.sent_log();
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let result = orchestrator
        .run_swap(
            test_address(0x42),
            test_route(),
            U256::from(100_000_000_000u64),
            SlippageTolerance::bps(50),
            1200,
        )
        .await;

    assert!(matches!(
        result,
        Err(OrchestratorError::WalletNotDeployed(addr)) if addr == test_address(0x42)
    ));
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_deployment_broadcasts_create_then_funding() {
    let chain = MockChainClient::new();
    let sent = chain.sent_log();
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let owners = vec![test_address(0x11)];
    let identity = predict_wallet_identity(&owners, 1, 0).unwrap();
    let funding = U256::from(1u8);

    let result = orchestrator
        .run_deployment(owners, 1, 0, funding)
        .await
        .expect("deployment flow succeeds");
    assert!(result.confirmed);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);

    let create = ISafeProxyFactory::createProxyWithNonceCall::abi_decode(&sent[0].data)
        .expect("first broadcast is a factory call");
    assert_eq!(create.saltNonce, U256::ZERO);
    let setup = ISafe::setupCall::abi_decode(&create.initializer).expect("valid initializer");
    assert_eq!(setup._owners, vec![test_address(0x11)]);

    assert_eq!(sent[1].to, identity.address);
    assert_eq!(sent[1].value, funding);
    assert!(sent[1].data.is_empty());
}

#[tokio::test]
async fn test_deployment_skips_create_when_code_exists() {
    let owners = vec![test_address(0x11)];
    let identity = predict_wallet_identity(&owners, 1, 0).unwrap();

    let chain = MockChainClient::new().with_deployed(identity.address);
    let sent = chain.sent_log();
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    orchestrator
        .run_deployment(owners, 1, 0, U256::from(1u8))
        .await
        .expect("repeat deployment is a no-op plus funding");

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "only the funding transfer goes out");
    assert_eq!(sent[0].to, identity.address);
}

#[tokio::test]
async fn test_reverted_deployment_is_fatal() {
    let chain = MockChainClient::new().with_receipt_outcome(ReceiptOutcome::Revert);
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let result = orchestrator
        .run_deployment(vec![test_address(0x11)], 1, 0, U256::from(1u8))
        .await;

    assert!(matches!(result, Err(OrchestratorError::DeploymentFailed(_))));
}

#[tokio::test]
async fn test_swap_is_one_wallet_transaction() {
    let wallet = test_address(0x42);
    let chain = MockChainClient::new().with_deployed(wallet);
    let sent = chain.sent_log();
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let result = orchestrator
        .run_swap(
            wallet,
            test_route(),
            U256::from(100_000_000_000u64),
            SlippageTolerance::bps(50),
            1200,
        )
        .await
        .expect("swap flow succeeds");
    assert!(result.confirmed);

    // Wrap, approve and swap never leave the wallet as separate
    // transactions.
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, wallet);
    assert_eq!(sent[0].value, U256::ZERO);

    let exec = ISafe::execTransactionCall::abi_decode(&sent[0].data)
        .expect("broadcast is an execTransaction");
    assert_eq!(exec.operation, 1);

    let multi_send =
        IMultiSend::multiSendCall::abi_decode(&exec.data).expect("valid multiSend payload");
    assert!(!multi_send.transactions.is_empty());
}

#[tokio::test]
async fn test_reverted_batch_leaves_no_partial_transactions() {
    let wallet = test_address(0x42);
    let chain = MockChainClient::new()
        .with_deployed(wallet)
        .with_receipt_outcome(ReceiptOutcome::Revert);
    let sent = chain.sent_log();
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let result = orchestrator
        .run_swap(
            wallet,
            test_route(),
            U256::from(100_000_000_000u64),
            SlippageTolerance::bps(50),
            1200,
        )
        .await;

    assert!(matches!(
        result,
        Err(OrchestratorError::BatchExecutionFailed(_))
    ));
    // The single reverted transaction is all that ever went out; no
    // step-by-step retry happens.
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_receipt_timeout_surfaces_with_tx_hash() {
    let wallet = test_address(0x42);
    let chain = MockChainClient::new()
        .with_deployed(wallet)
        .with_receipt_outcome(ReceiptOutcome::Timeout);
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let result = orchestrator
        .run_swap(
            wallet,
            test_route(),
            U256::from(100_000_000_000u64),
            SlippageTolerance::bps(50),
            1200,
        )
        .await;

    assert!(matches!(
        result,
        Err(OrchestratorError::ConfirmationTimeout { .. })
    ));
}

#[tokio::test]
async fn test_zero_amount_swap_rejected_before_broadcast() {
    let wallet = test_address(0x42);
    let chain = MockChainClient::new().with_deployed(wallet);
    let sent = chain.sent_log();
    let orchestrator = SmartWalletOrchestrator::new(Box::new(chain));

    let result = orchestrator
        .run_swap(
            wallet,
            test_route(),
            U256::ZERO,
            SlippageTolerance::bps(50),
            1200,
        )
        .await;

    assert!(matches!(
        result,
        Err(OrchestratorError::InvalidTradeParameters(_))
    ));
    assert!(sent.lock().unwrap().is_empty());
}
