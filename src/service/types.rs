use alloy::primitives::{Address, Bytes, TxHash, U256};

use crate::repository::TxReceiptInfo;

/// A smart-contract wallet, either predicted (before deployment) or loaded
/// (already on chain). Construction enforces a non-empty owner set and
/// `1 <= threshold <= owners.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletIdentity {
    pub address: Address,
    pub owners: Vec<Address>,
    pub threshold: usize,
}

/// Safe operation byte: 0 = call, 1 = delegatecall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    DelegateCall,
}

impl CallKind {
    pub fn as_byte(self) -> u8 {
        match self {
            CallKind::Call => 0,
            CallKind::DelegateCall => 1,
        }
    }
}

/// One step of a wallet batch. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub kind: CallKind,
}

/// An ordered batch of sub-transactions executed atomically by the wallet:
/// all succeed or the whole wallet transaction reverts.
///
/// The ordering invariant (wrap before approve before swap) is checked when
/// the batch is built, so holding a `TransactionBatch` means the order is
/// valid. Only [`TransactionBatchBuilder`](super::batch::TransactionBatchBuilder)
/// constructs one.
#[derive(Debug, Clone)]
pub struct TransactionBatch {
    steps: Vec<SubTransaction>,
}

impl TransactionBatch {
    pub(super) fn new(steps: Vec<SubTransaction>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[SubTransaction] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Snapshot of a concentrated-liquidity pool. Read fresh for every swap
/// attempt; never cached across attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Current price as sqrt(token1/token0) in X96 fixed point.
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
}

/// A concrete, slippage-bounded swap derived from a [`PoolState`].
#[derive(Debug, Clone)]
pub struct TradeQuote {
    pub amount_in: U256,
    /// Output at the current price with no slippage applied.
    pub theoretical_output: U256,
    /// `floor(theoretical_output * (1 - slippage))`.
    pub min_output: U256,
    /// Absolute Unix timestamp; the router rejects execution after this.
    pub deadline: u64,
    /// Pools traversed, in order. Single-hop in this crate.
    pub route: Vec<Address>,
    /// The encoded router call implementing this quote.
    pub swap: SubTransaction,
}

/// Outcome of a confirmed (or definitively failed) submission. Terminal:
/// once the receipt is observed the orchestrator holds no further
/// obligation.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub tx_hash: TxHash,
    pub confirmed: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

impl From<TxReceiptInfo> for SubmissionResult {
    fn from(receipt: TxReceiptInfo) -> Self {
        Self {
            tx_hash: receipt.tx_hash,
            confirmed: receipt.success,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }
    }
}

/// Slippage tolerance as a ratio, e.g. 50/10000 for 0.50%. Valid range is
/// [0, 1): the numerator must be strictly below the denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlippageTolerance {
    pub numerator: u32,
    pub denominator: u32,
}

impl SlippageTolerance {
    pub fn bps(numerator: u32) -> Self {
        Self {
            numerator,
            denominator: 10_000,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.denominator > 0 && self.numerator < self.denominator
    }
}
