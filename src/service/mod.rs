pub mod batch;
pub mod error;
pub mod pool;
pub mod trade;
pub mod types;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod tests;

pub use batch::{BatchIntent, TransactionBatchBuilder};
pub use error::OrchestratorError;
pub use pool::PoolStateReader;
pub use trade::{TradeBuilder, TradeParams, TradeRoute};
pub use types::{
    PoolState, SlippageTolerance, SubTransaction, SubmissionResult, TradeQuote, TransactionBatch,
    WalletIdentity,
};
pub use wallet::{SmartWalletOrchestrator, predict_wallet_identity};

pub(crate) type ServiceResult<T> = Result<T, OrchestratorError>;
