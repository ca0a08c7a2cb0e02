use alloy::primitives::{Address, Bytes, U256, address, hex, keccak256};
use alloy::sol_types::SolCall;
use tracing::instrument;

use super::ServiceResult;
use super::batch::{BatchIntent, TransactionBatchBuilder};
use super::error::OrchestratorError;
use super::pool::PoolStateReader;
use super::trade::{TradeBuilder, TradeParams, TradeRoute};
use super::types::{SlippageTolerance, SubmissionResult, TransactionBatch, WalletIdentity};
use super::utils::format_balance;
use crate::config::ConfigError;
use crate::repository::ChainClient;
use crate::repository::contract::{IMultiSend, ISafe, ISafeProxyFactory};

// Canonical Safe v1.3.0 deployment on Ethereum mainnet.
const SAFE_PROXY_FACTORY: Address = address!("0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2");
const SAFE_SINGLETON: Address = address!("0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552");
const FALLBACK_HANDLER: Address = address!("0xf48f2B2d2a534e402487b3ee7C18c33Aec0Fe5e4");
const MULTI_SEND_CALL_ONLY: Address = address!("0x40A2aCCbd92BCA938b02010E17A5b8929b49130D");

/// Creation bytecode of the Safe v1.3.0 proxy. CREATE2 address prediction
/// hashes this together with the singleton address, so it must match the
/// factory's deployed code byte for byte.
const PROXY_CREATION_CODE: &[u8] = &hex!(
    "608060405234801561001057600080fd5b506040516101e63803806101e68339818101604052602081101561003357600080fd5b8101908080519060200190929190505050600073ffffffffffffffffffffffffffffffffffffffff168173ffffffffffffffffffffffffffffffffffffffff1614156100ca576040517f08c379a00000000000000000000000000000000000000000000000000000000081526004018080602001828103825260228152602001806101c46022913960400191505060405180910390fd5b806000806101000a81548173ffffffffffffffffffffffffffffffffffffffff021916908373ffffffffffffffffffffffffffffffffffffffff1602179055505060ab806101196000396000f3fe608060405273ffffffffffffffffffffffffffffffffffffffff600054167fa619486e0000000000000000000000000000000000000000000000000000000060003514156050578060005260206000f35b3660008037600080366000845af43d6000803e60008114156070573d6000fd5b3d6000f3fea264697066735822122003d1488ee65e08fa41e58e888a9865554c535f2c77126a82cb4c0f917f31441364736f6c63430007060033496e76616c69642073696e676c65746f6e20616464726573732070726f7669646564"
);

/// Predicts the deterministic wallet address for an owner set, threshold
/// and salt nonce, without any chain I/O. Same inputs always yield the
/// same address.
///
/// Safe's CREATE2 scheme: `salt = keccak(keccak(initializer) || saltNonce)`
/// and `init_code_hash = keccak(proxy_creation_code || uint256(singleton))`.
pub fn predict_wallet_identity(
    owners: &[Address],
    threshold: usize,
    salt_nonce: u64,
) -> ServiceResult<WalletIdentity> {
    if owners.is_empty() {
        return Err(invalid_wallet_config("wallet.owners", "owner set is empty"));
    }
    if threshold == 0 || threshold > owners.len() {
        return Err(invalid_wallet_config(
            "wallet.threshold",
            &format!("threshold {threshold} outside 1..={}", owners.len()),
        ));
    }

    let initializer = setup_initializer(owners, threshold);

    let mut salt_preimage = [0u8; 64];
    salt_preimage[..32].copy_from_slice(keccak256(&initializer).as_slice());
    salt_preimage[32..].copy_from_slice(&U256::from(salt_nonce).to_be_bytes::<32>());
    let salt = keccak256(salt_preimage);

    let mut init_code = PROXY_CREATION_CODE.to_vec();
    let mut singleton_word = [0u8; 32];
    singleton_word[12..].copy_from_slice(SAFE_SINGLETON.as_slice());
    init_code.extend_from_slice(&singleton_word);
    let init_code_hash = keccak256(&init_code);

    Ok(WalletIdentity {
        address: SAFE_PROXY_FACTORY.create2(salt, init_code_hash),
        owners: owners.to_vec(),
        threshold,
    })
}

/// ABI-encoded `setup(...)` call, invoked through the proxy at deployment.
fn setup_initializer(owners: &[Address], threshold: usize) -> Vec<u8> {
    ISafe::setupCall {
        _owners: owners.to_vec(),
        _threshold: U256::from(threshold),
        to: Address::ZERO,
        data: Bytes::new(),
        fallbackHandler: FALLBACK_HANDLER,
        paymentToken: Address::ZERO,
        payment: U256::ZERO,
        paymentReceiver: Address::ZERO,
    }
    .abi_encode()
}

/// Factory calldata deploying the wallet. Pure construction; nothing is
/// broadcast here.
fn deployment_calldata(owners: &[Address], threshold: usize, salt_nonce: u64) -> Bytes {
    let call = ISafeProxyFactory::createProxyWithNonceCall {
        _singleton: SAFE_SINGLETON,
        initializer: Bytes::from(setup_initializer(owners, threshold)),
        saltNonce: U256::from(salt_nonce),
    };
    Bytes::from(call.abi_encode())
}

/// Pre-validated owner signature: `r = owner, s = 0, v = 1`. The Safe
/// accepts it when the transaction sender IS that owner, which is exactly
/// how this orchestrator submits on a 1-of-1 wallet.
fn prevalidated_signature(owner: Address) -> Bytes {
    let mut signature = [0u8; 65];
    signature[12..32].copy_from_slice(owner.as_slice());
    signature[64] = 1;
    Bytes::from(signature.to_vec())
}

/// Wraps a batch into a wallet-level `execTransaction` targeting
/// MultiSendCallOnly via delegatecall. Consumes the batch: a built batch is
/// submitted at most once.
fn exec_transaction_calldata(batch: TransactionBatch, owner: Address) -> Bytes {
    let multi_send = IMultiSend::multiSendCall {
        transactions: batch.encode_multi_send(),
    };

    let call = ISafe::execTransactionCall {
        to: MULTI_SEND_CALL_ONLY,
        value: U256::ZERO,
        data: Bytes::from(multi_send.abi_encode()),
        operation: 1, // delegatecall into MultiSendCallOnly
        safeTxGas: U256::ZERO,
        baseGas: U256::ZERO,
        gasPrice: U256::ZERO,
        gasToken: Address::ZERO,
        refundReceiver: Address::ZERO,
        signatures: prevalidated_signature(owner),
    };

    Bytes::from(call.abi_encode())
}

fn invalid_wallet_config(key: &str, reason: &str) -> OrchestratorError {
    OrchestratorError::Configuration(ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    })
}

/// Drives the wallet's lifecycle: deployment (predict, deploy, fund) and
/// batched swap execution (verify, quote, batch, submit, confirm, report).
///
/// One flow runs to completion at a time; every step depends on the
/// previous step's on-chain effect, so there is no internal parallelism.
pub struct SmartWalletOrchestrator {
    chain: Box<dyn ChainClient>,
}

impl SmartWalletOrchestrator {
    pub fn new(chain: Box<dyn ChainClient>) -> Self {
        Self { chain }
    }

    pub fn signer_address(&self) -> Address {
        self.chain.signer_address()
    }

    /// Deployment flow: predict the wallet address, deploy through the
    /// proxy factory, then fund the wallet with `funding_wei`.
    ///
    /// If code already exists at the predicted address the deploy step is
    /// skipped: redeploying with the same salt can never produce a second
    /// wallet, so the flow proceeds straight to funding. A reverted
    /// deployment is fatal; retrying with the same salt is not attempted.
    #[instrument(skip(self), err)]
    pub async fn run_deployment(
        &self,
        owners: Vec<Address>,
        threshold: usize,
        salt_nonce: u64,
        funding_wei: U256,
    ) -> ServiceResult<SubmissionResult> {
        let owners = if owners.is_empty() {
            vec![self.chain.signer_address()]
        } else {
            owners
        };

        let identity = predict_wallet_identity(&owners, threshold, salt_nonce)?;
        tracing::info!(
            "Predicted wallet address: {} (owners={}, threshold={})",
            identity.address,
            identity.owners.len(),
            identity.threshold
        );

        if self.chain.is_deployed(identity.address).await? {
            tracing::info!(
                "Wallet {} already deployed for this salt; skipping deployment",
                identity.address
            );
        } else {
            let calldata = deployment_calldata(&identity.owners, identity.threshold, salt_nonce);

            let tx_hash = self
                .chain
                .send_transaction(SAFE_PROXY_FACTORY, U256::ZERO, calldata)
                .await
                .map_err(|e| OrchestratorError::DeploymentFailed(e.to_string()))?;
            tracing::info!("Deployment transaction broadcast: {tx_hash}");

            let receipt = self.chain.wait_for_receipt(tx_hash).await?;
            if !receipt.success {
                return Err(OrchestratorError::DeploymentFailed(format!(
                    "deployment transaction {tx_hash} reverted"
                )));
            }
            tracing::info!(
                "Wallet deployed at {} in block {:?}",
                identity.address,
                receipt.block_number
            );
        }

        // Funding confirms the wallet exists before any batch logic runs
        // against it.
        let fund_hash = self
            .chain
            .send_transaction(identity.address, funding_wei, Bytes::new())
            .await
            .map_err(|e| OrchestratorError::DeploymentFailed(e.to_string()))?;

        let fund_receipt = self.chain.wait_for_receipt(fund_hash).await?;
        if !fund_receipt.success {
            return Err(OrchestratorError::DeploymentFailed(format!(
                "funding transaction {fund_hash} reverted"
            )));
        }

        tracing::info!(
            "Funded wallet {} with {} wei (tx {fund_hash})",
            identity.address,
            funding_wei
        );

        Ok(fund_receipt.into())
    }

    /// Swap flow: wrap, approve and swap in ONE atomic wallet transaction.
    ///
    /// The batch covers the trade input exactly: wrap amount = approval
    /// amount = `amount_in`, which upholds the batch's cross-step amount
    /// invariant. A reverted batch (slippage, expired deadline) invalidates
    /// the quote; a fresh attempt restarts from a fresh pool read.
    #[instrument(skip(self, route), err)]
    pub async fn run_swap(
        &self,
        wallet: Address,
        route: TradeRoute,
        amount_in: U256,
        slippage: SlippageTolerance,
        deadline_offset_secs: u64,
    ) -> ServiceResult<SubmissionResult> {
        let chain_id = self.chain.get_chain_id().await?;

        // Precondition, checked before any chain write.
        if !self.chain.is_deployed(wallet).await? {
            return Err(OrchestratorError::WalletNotDeployed(wallet));
        }
        tracing::info!("Wallet {wallet} is deployed on chain {chain_id}; building swap batch");

        let pool_state = PoolStateReader::new(&*self.chain).read(route.pool).await?;

        let params = TradeParams {
            amount_in,
            slippage,
            deadline_offset_secs,
            recipient: wallet,
        };
        let now = chrono::Utc::now().timestamp();
        let quote = TradeBuilder::new(route.clone()).build(&pool_state, &params, now)?;
        tracing::info!(
            "Quote: {} in -> {} out (min {}), deadline {}",
            quote.amount_in,
            quote.theoretical_output,
            quote.min_output,
            quote.deadline
        );

        let batch = TransactionBatchBuilder::new()
            .push(BatchIntent::WrapNative {
                token: route.token_in,
                amount: amount_in,
            })
            .push(BatchIntent::Approve {
                token: route.token_in,
                spender: route.router,
                amount: amount_in,
            })
            .push(BatchIntent::Swap(quote))
            .build()?;

        let report_tokens = [route.token_in, route.token_out];
        self.report_balances("before", wallet, &report_tokens).await;

        let calldata = exec_transaction_calldata(batch, self.chain.signer_address());
        let tx_hash = self
            .chain
            .send_transaction(wallet, U256::ZERO, calldata)
            .await
            .map_err(|e| OrchestratorError::BatchExecutionFailed(e.to_string()))?;
        tracing::info!("Batch transaction broadcast: {tx_hash}");

        let receipt = self.chain.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            return Err(OrchestratorError::BatchExecutionFailed(format!(
                "wallet transaction {tx_hash} reverted; \
                 possible slippage breach or expired deadline"
            )));
        }
        tracing::info!(
            "Batch confirmed in block {:?} (gas used {})",
            receipt.block_number,
            receipt.gas_used
        );

        // Best-effort: the swap already confirmed, so a failed read here is
        // a warning, never an error.
        self.report_balances("after", wallet, &report_tokens).await;

        Ok(receipt.into())
    }

    async fn report_balances(&self, stage: &str, wallet: Address, tokens: &[Address]) {
        match self.chain.get_eth_balance(wallet).await {
            Ok(balance) => {
                tracing::info!("ETH balance {stage}: {}", format_balance(balance, 18));
            }
            Err(e) => tracing::warn!("Failed to read ETH balance {stage}: {e}"),
        }

        for token in tokens {
            match self.chain.get_erc20_balance(*token, wallet).await {
                Ok(token_balance) => tracing::info!(
                    "{} balance {stage}: {}",
                    token_balance.symbol,
                    format_balance(token_balance.balance, token_balance.decimals)
                ),
                Err(e) => tracing::warn!("Failed to read balance of {token} {stage}: {e}"),
            }
        }
    }
}
