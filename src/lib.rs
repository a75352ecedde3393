pub mod chain;
pub mod checker;
pub mod config;
pub mod encoder;
pub mod error;
pub mod jobs;
pub mod types;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::{ChainClient, RpcClient};
pub use config::Settings;
pub use error::{Result, WalletError};
pub use types::{Balance, ExecutionReport, TokenDescriptor, TxOutcome};
pub use wallet::{Account, Wallet};
