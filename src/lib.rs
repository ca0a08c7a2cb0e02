pub mod config;
pub mod repository;
pub mod service;

pub use config::Config;
pub use repository::{AlloyChainClient, ChainClient, ChainError};
pub use service::{OrchestratorError, SmartWalletOrchestrator};
