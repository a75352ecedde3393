//! Scripted in-memory chain for unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use alloy::{
    consensus::{Transaction, TxEnvelope},
    eips::eip2718::Decodable2718,
    primitives::{Address, Bytes, TxHash, U256},
    sol_types::SolCall,
};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;

use crate::{
    chain::ChainClient,
    config::{test_settings, Settings},
    encoder::{AbiEncoder, IERC20},
    error::{Result, WalletError},
    types::ReceiptLookup,
    wallet::Wallet,
};

/// A broadcast transaction as decoded from its signed envelope.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub hash: TxHash,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub nonce: u64,
    pub gas_price: Option<u128>,
    pub gas_limit: u64,
}

impl SentTx {
    /// Recipient and amount of an ERC-20 `transfer` payload.
    pub fn token_transfer(&self) -> Option<(Address, U256)> {
        if self.input.len() < 68 || self.input[..4] != IERC20::transferCall::SELECTOR {
            return None;
        }
        Some((
            Address::from_slice(&self.input[16..36]),
            U256::from_be_slice(&self.input[36..68]),
        ))
    }
}

#[derive(Default)]
struct MockState {
    coin: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    failing_tokens: Vec<Address>,
    nonces: HashMap<Address, u64>,
    gas_price: u128,
    gas_price_queries: usize,
    fail_gas_price: bool,
    fail_estimate: bool,
    fail_broadcast: bool,
    broadcast_attempts: usize,
    receipts: VecDeque<ReceiptLookup>,
    never_found: bool,
    fail_receipts_after: Option<usize>,
    receipt_polls: usize,
    sent: Vec<SentTx>,
}

pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                gas_price: 1_000_000_000,
                ..Default::default()
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_coin_balance(&self, owner: Address, amount: U256) {
        self.state().coin.insert(owner, amount);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state().tokens.insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state().allowances.insert((token, owner, spender), amount);
    }

    pub fn fail_token_reads(&self, token: Address) {
        self.state().failing_tokens.push(token);
    }

    pub fn set_nonce(&self, owner: Address, nonce: u64) {
        self.state().nonces.insert(owner, nonce);
    }

    pub fn set_gas_price(&self, price: u128) {
        self.state().gas_price = price;
    }

    pub fn fail_gas_price(&self) {
        self.state().fail_gas_price = true;
    }

    pub fn fail_estimate(&self) {
        self.state().fail_estimate = true;
    }

    pub fn fail_broadcast(&self) {
        self.state().fail_broadcast = true;
    }

    /// Receipt answers served in order; once drained every receipt is a success.
    pub fn script_receipts(&self, receipts: Vec<ReceiptLookup>) {
        self.state().receipts = receipts.into();
    }

    pub fn receipts_never_found(&self) {
        self.state().never_found = true;
    }

    pub fn fail_receipts_after(&self, polls: usize) {
        self.state().fail_receipts_after = Some(polls);
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state().sent.clone()
    }

    pub fn gas_price_queries(&self) -> usize {
        self.state().gas_price_queries
    }

    pub fn broadcast_attempts(&self) -> usize {
        self.state().broadcast_attempts
    }

    pub fn receipt_polls(&self) -> usize {
        self.state().receipt_polls
    }
}

fn target(tx: &TransactionRequest) -> Option<Address> {
    tx.to.and_then(|kind| kind.to().copied())
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.state().coin.get(&address).copied().unwrap_or_default())
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        let state = self.state();
        let token = target(&tx).unwrap_or_default();
        if state.failing_tokens.contains(&token) {
            return Err(WalletError::ProviderError("execution reverted".to_string()));
        }

        let input = tx.input.input().cloned().unwrap_or_default();
        let value = if input.starts_with(&IERC20::balanceOfCall::SELECTOR) {
            let owner = Address::from_slice(&input[16..36]);
            state.tokens.get(&(token, owner)).copied().unwrap_or_default()
        } else if input.starts_with(&IERC20::allowanceCall::SELECTOR) {
            let owner = Address::from_slice(&input[16..36]);
            let spender = Address::from_slice(&input[48..68]);
            state
                .allowances
                .get(&(token, owner, spender))
                .copied()
                .unwrap_or_default()
        } else {
            return Err(WalletError::ProviderError("unknown call".to_string()));
        };
        Ok(Bytes::from(value.to_be_bytes::<32>().to_vec()))
    }

    async fn get_gas_price(&self) -> Result<u128> {
        let mut state = self.state();
        state.gas_price_queries += 1;
        if state.fail_gas_price {
            return Err(WalletError::ProviderError("Failed to get gas price: boom".to_string()));
        }
        Ok(state.gas_price)
    }

    async fn get_pending_nonce(&self, address: Address) -> Result<u64> {
        Ok(self.state().nonces.get(&address).copied().unwrap_or_default())
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64> {
        if self.state().fail_estimate {
            return Err(WalletError::ProviderError("execution reverted".to_string()));
        }
        let has_input = tx.input.input().is_some_and(|input| !input.is_empty());
        Ok(if has_input { 60_000 } else { 21_000 })
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash> {
        let mut state = self.state();
        state.broadcast_attempts += 1;
        if state.fail_broadcast {
            return Err(WalletError::ProviderError("connection reset".to_string()));
        }

        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| WalletError::Encoding(e.to_string()))?;
        let sent = SentTx {
            hash: *envelope.tx_hash(),
            to: envelope.to(),
            value: envelope.value(),
            input: envelope.input().clone(),
            nonce: envelope.nonce(),
            gas_price: envelope.gas_price(),
            gas_limit: envelope.gas_limit(),
        };
        let hash = sent.hash;
        state.sent.push(sent);
        Ok(hash)
    }

    async fn get_receipt(&self, _hash: TxHash) -> Result<ReceiptLookup> {
        let mut state = self.state();
        state.receipt_polls += 1;
        if state
            .fail_receipts_after
            .is_some_and(|limit| state.receipt_polls > limit)
        {
            return Err(WalletError::ProviderError("upstream unavailable".to_string()));
        }
        if state.never_found {
            return Ok(ReceiptLookup::NotIndexedYet);
        }
        Ok(state
            .receipts
            .pop_front()
            .unwrap_or(ReceiptLookup::Found { success: true }))
    }
}

/// Deterministic private key for the n-th test wallet.
pub fn test_key(n: usize) -> String {
    format!("0x{:064x}", n + 0x1000)
}

pub fn test_wallets(count: usize, chain: Arc<MockChain>) -> Vec<Wallet> {
    test_wallets_with(count, chain, test_settings())
}

pub fn test_wallets_with(count: usize, chain: Arc<MockChain>, settings: Settings) -> Vec<Wallet> {
    let keys: Vec<String> = (1..=count).map(test_key).collect();
    Wallet::from_keys(&keys, chain, Arc::new(AbiEncoder), Arc::new(settings)).unwrap()
}
