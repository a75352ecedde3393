use alloy::primitives::TxHash;
use thiserror::Error;

use crate::types::TxStage;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid environment variable value: {0}")]
    InvalidEnvVar(String),

    #[error("Invalid settings: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The key itself is never part of the message.
    #[error("Invalid private key for wallet #{index}")]
    InvalidKey { index: usize },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Submission failed while {stage}: {reason}")]
    SubmissionFailed { stage: TxStage, reason: String },

    #[error("Tx failed: {0}")]
    Reverted(TxHash),

    #[error("Tx not found: {0}")]
    TimedOut(TxHash),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<WalletError>,
    },
}

impl WalletError {
    /// Wraps the error with an operation-level message, keeping it as the source.
    pub fn context(self, context: impl Into<String>) -> Self {
        WalletError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error beneath any context wrappers.
    pub fn root(&self) -> &WalletError {
        let mut current = self;
        while let WalletError::Context { source, .. } = current {
            current = source;
        }
        current
    }
}

/// Adds `.context(..)` to results carrying a [`WalletError`].
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;
