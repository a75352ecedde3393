use alloy::{
    eips::eip2718::Encodable2718,
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
};
use alloy_rpc_types::TransactionRequest;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    chain::ChainClient,
    config::Settings,
    error::{Result, ResultExt, WalletError},
    types::{ReceiptLookup, TxOutcome, TxStage},
    utils::parse_address,
};

use super::Account;

const GAS_MULTIPLIER_SCALE: u128 = 1_000;

/// Builds, signs, broadcasts and confirms transactions.
///
/// There is no internal queue: one `send_tx` call is one pass through the
/// submission steps, and callers serialize sends for the same account.
#[derive(Clone)]
pub struct TransactionManager {
    chain: Arc<dyn ChainClient>,
    settings: Arc<Settings>,
}

impl TransactionManager {
    /// Creates a new TransactionManager
    pub fn new(chain: Arc<dyn ChainClient>, settings: Arc<Settings>) -> Self {
        Self { chain, settings }
    }

    /// Builds a transaction request to `to`, which is validated before any network call.
    pub async fn build_tx(
        &self,
        account: &Account,
        to: &str,
        value: U256,
        payload: Bytes,
    ) -> Result<TransactionRequest> {
        let to = parse_address(to)?;
        self.build_tx_to(account, to, value, payload).await
    }

    /// Builds a transaction request with current network parameters
    pub async fn build_tx_to(
        &self,
        account: &Account,
        to: Address,
        value: U256,
        payload: Bytes,
    ) -> Result<TransactionRequest> {
        self.fill_request(account, to, value, payload)
            .await
            .context("failed to build transaction data")
    }

    async fn fill_request(
        &self,
        account: &Account,
        to: Address,
        value: U256,
        payload: Bytes,
    ) -> Result<TransactionRequest> {
        let network_price = self.chain.get_gas_price().await?;
        let gas_price = apply_multiplier(network_price, self.settings.gas_multiplier.sample());

        // pending, so back-to-back sends do not reuse a nonce
        let nonce = self.chain.get_pending_nonce(account.address()).await?;

        Ok(TransactionRequest::default()
            .with_from(account.address())
            .with_to(to)
            .with_value(value)
            .with_input(payload)
            .with_gas_price(gas_price)
            .with_nonce(nonce)
            .with_chain_id(self.settings.chain_id))
    }

    /// Submits the request and waits for its receipt. Returns the hash once confirmed.
    pub async fn send_tx(&self, account: &Account, tx: TransactionRequest) -> Result<TxHash> {
        match self.submit(account, tx).await? {
            TxOutcome::Confirmed(hash) => Ok(hash),
            TxOutcome::Reverted(hash) => Err(WalletError::Reverted(hash)),
            TxOutcome::NotFoundTimeout(hash) => Err(WalletError::TimedOut(hash)),
            TxOutcome::SubmissionError { stage, reason } => {
                Err(WalletError::SubmissionFailed { stage, reason })
            }
        }
    }

    /// Runs one submission through estimate, sign, broadcast and receipt polling.
    ///
    /// Only a receipt query failing with something other than "not indexed yet"
    /// comes back as `Err`; every other ending is a [`TxOutcome`].
    pub async fn submit(&self, account: &Account, tx: TransactionRequest) -> Result<TxOutcome> {
        let gas_limit = match self.chain.estimate_gas(tx.clone()).await {
            Ok(gas) => gas,
            Err(e) => return Ok(submission_error(TxStage::Estimating, e)),
        };
        let tx = tx.with_gas_limit(gas_limit);

        let envelope = match tx.build(account.signer()).await {
            Ok(envelope) => envelope,
            Err(e) => return Ok(submission_error(TxStage::Signing, e)),
        };
        let raw: Bytes = envelope.encoded_2718().into();

        let hash = match self.chain.send_raw_transaction(raw).await {
            Ok(hash) => hash,
            Err(e) => return Ok(submission_error(TxStage::Broadcasting, e)),
        };
        debug!(account = account.info(), %hash, gas_limit, "Transaction broadcast");

        let outcome = self.wait_for_receipt(hash).await?;
        match &outcome {
            TxOutcome::Confirmed(hash) => info!("{} Tx successful: {}", account.info(), hash),
            TxOutcome::Reverted(hash) => warn!("{} Tx reverted: {}", account.info(), hash),
            TxOutcome::NotFoundTimeout(hash) => {
                warn!("{} Tx not found in time: {}", account.info(), hash)
            }
            TxOutcome::SubmissionError { .. } => {}
        }
        Ok(outcome)
    }

    /// Polls for the receipt until it is found or the timeout elapses.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxOutcome> {
        let timeout = self.settings.receipt_timeout();
        let interval = self.settings.receipt_poll_interval();
        let start = tokio::time::Instant::now();

        loop {
            match self.chain.get_receipt(hash).await? {
                ReceiptLookup::Found { success: true } => return Ok(TxOutcome::Confirmed(hash)),
                ReceiptLookup::Found { success: false } => return Ok(TxOutcome::Reverted(hash)),
                ReceiptLookup::NotIndexedYet => {
                    let elapsed = start.elapsed();
                    if elapsed > timeout {
                        return Ok(TxOutcome::NotFoundTimeout(hash));
                    }
                    debug!(%hash, elapsed = %format_elapsed(elapsed), "Receipt not indexed yet");
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

/// floor(price × multiplier), with the multiplier applied in whole per-mille steps.
fn apply_multiplier(price: u128, multiplier: f64) -> u128 {
    let per_mille = (multiplier * GAS_MULTIPLIER_SCALE as f64).round() as u128;
    price.saturating_mul(per_mille) / GAS_MULTIPLIER_SCALE
}

fn submission_error(stage: TxStage, reason: impl std::fmt::Display) -> TxOutcome {
    TxOutcome::SubmissionError {
        stage,
        reason: reason.to_string(),
    }
}

fn format_elapsed(elapsed: Duration) -> humantime::FormattedDuration {
    humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64))
}
