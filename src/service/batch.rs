use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use super::ServiceResult;
use super::error::OrchestratorError;
use super::types::{CallKind, SubTransaction, TradeQuote, TransactionBatch};
use crate::repository::contract::{IERC20, IWETH9};

/// One step a caller wants in the batch, before encoding.
#[derive(Debug, Clone)]
pub enum BatchIntent {
    /// Wrap `amount` of the native asset into `token` via `deposit()`.
    WrapNative { token: Address, amount: U256 },
    /// ERC20 `approve(spender, amount)` on `token`.
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    /// The router call of an already-built quote.
    Swap(TradeQuote),
}

/// Assembles ordered intents into a [`TransactionBatch`], preserving input
/// order and rejecting orderings that cannot execute: an approve after a
/// swap, or a wrap after an approve.
///
/// Cross-step amount consistency (approval covering the trade input, wrap
/// covering the trade input) is NOT checked here; the orchestrator upholds
/// it where the intents are composed.
#[derive(Debug, Default)]
pub struct TransactionBatchBuilder {
    intents: Vec<BatchIntent>,
}

impl TransactionBatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, intent: BatchIntent) -> Self {
        self.intents.push(intent);
        self
    }

    pub fn build(self) -> ServiceResult<TransactionBatch> {
        if self.intents.is_empty() {
            return Err(OrchestratorError::InvalidTradeParameters(
                "batch must contain at least one step".to_string(),
            ));
        }

        let mut seen_approve = false;
        let mut seen_swap = false;
        for intent in &self.intents {
            match intent {
                BatchIntent::WrapNative { .. } => {
                    if seen_approve || seen_swap {
                        return Err(OrchestratorError::InvalidTradeParameters(
                            "wrap step must precede approve and swap steps".to_string(),
                        ));
                    }
                }
                BatchIntent::Approve { .. } => {
                    if seen_swap {
                        return Err(OrchestratorError::InvalidTradeParameters(
                            "approve step must precede the swap step".to_string(),
                        ));
                    }
                    seen_approve = true;
                }
                BatchIntent::Swap(_) => seen_swap = true,
            }
        }

        let steps = self.intents.into_iter().map(encode_intent).collect();
        Ok(TransactionBatch::new(steps))
    }
}

fn encode_intent(intent: BatchIntent) -> SubTransaction {
    match intent {
        BatchIntent::WrapNative { token, amount } => SubTransaction {
            to: token,
            value: amount,
            data: Bytes::from(IWETH9::depositCall {}.abi_encode()),
            kind: CallKind::Call,
        },
        BatchIntent::Approve {
            token,
            spender,
            amount,
        } => SubTransaction {
            to: token,
            value: U256::ZERO,
            data: Bytes::from(IERC20::approveCall { spender, amount }.abi_encode()),
            kind: CallKind::Call,
        },
        BatchIntent::Swap(quote) => quote.swap,
    }
}

impl TransactionBatch {
    /// Packs the batch into the MultiSend wire format: for each step,
    /// `operation (1) ++ to (20) ++ value (32) ++ data.len (32) ++ data`.
    pub fn encode_multi_send(&self) -> Bytes {
        let mut packed = Vec::new();
        for step in self.steps() {
            packed.push(step.kind.as_byte());
            packed.extend_from_slice(step.to.as_slice());
            packed.extend_from_slice(&step.value.to_be_bytes::<32>());
            packed.extend_from_slice(&U256::from(step.data.len()).to_be_bytes::<32>());
            packed.extend_from_slice(&step.data);
        }
        Bytes::from(packed)
    }
}
