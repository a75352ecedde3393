pub mod balance;
pub mod execution;
pub mod operations;
pub mod transaction;

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    signers::local::PrivateKeySigner,
};
use std::{fmt, sync::Arc};

use crate::{
    chain::ChainClient,
    config::Settings,
    encoder::PayloadEncoder,
    error::{Result, WalletError},
};

use self::transaction::TransactionManager;

/// A signing identity derived from one private key.
///
/// The key only lives inside the signer; `Debug` and every log line use
/// [`Account::info`] instead.
pub struct Account {
    index: usize,
    address: Address,
    signer: EthereumWallet,
    info: String,
}

impl Account {
    /// Derives the account from a hex private key. `index` is 1-based.
    pub fn from_private_key(index: usize, key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|_| WalletError::InvalidKey { index })?;
        let address = signer.address();
        let checksummed = address.to_checksum(None);
        let info = format!(
            "[#{} - {}...{}]",
            index,
            &checksummed[..5],
            &checksummed[checksummed.len() - 5..]
        );

        Ok(Self {
            index,
            address,
            signer: EthereumWallet::new(signer),
            info,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Short identity used as the prefix of account log lines
    pub fn info(&self) -> &str {
        &self.info
    }

    pub(crate) fn signer(&self) -> &EthereumWallet {
        &self.signer
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// An account bound to the chain it operates on.
///
/// Cheap to clone; all clones share the same account, client and settings.
#[derive(Clone)]
pub struct Wallet {
    account: Arc<Account>,
    chain: Arc<dyn ChainClient>,
    encoder: Arc<dyn PayloadEncoder>,
    settings: Arc<Settings>,
    transactions: TransactionManager,
}

impl Wallet {
    pub fn new(
        account: Account,
        chain: Arc<dyn ChainClient>,
        encoder: Arc<dyn PayloadEncoder>,
        settings: Arc<Settings>,
    ) -> Self {
        let transactions = TransactionManager::new(chain.clone(), settings.clone());
        Self {
            account: Arc::new(account),
            chain,
            encoder,
            settings,
            transactions,
        }
    }

    /// Builds one wallet per key, numbered from 1 in input order.
    pub fn from_keys(
        keys: &[String],
        chain: Arc<dyn ChainClient>,
        encoder: Arc<dyn PayloadEncoder>,
        settings: Arc<Settings>,
    ) -> Result<Vec<Self>> {
        keys.iter()
            .enumerate()
            .map(|(i, key)| {
                let account = Account::from_private_key(i + 1, key)?;
                Ok(Self::new(
                    account,
                    chain.clone(),
                    encoder.clone(),
                    settings.clone(),
                ))
            })
            .collect()
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn index(&self) -> usize {
        self.account.index()
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    pub fn info(&self) -> &str {
        self.account.info()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Wallet").field(&self.account).finish()
    }
}
