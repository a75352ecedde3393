//! High-level wallet actions built on the transaction pipeline.
//!
//! Each action validates its inputs, builds its payload, then hands a single
//! request to [`TransactionManager::send_tx`](super::transaction::TransactionManager::send_tx).
//! Failures are wrapped with the action name; the cause stays reachable via
//! [`WalletError::root`].

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
};
use tracing::info;

use crate::{
    config::{COIN_DECIMALS, COIN_DISPLAY_DECIMALS, COIN_SYMBOL},
    encoder::ContractCall,
    error::{Result, ResultExt, WalletError},
    types::{ApproveOutcome, Balance, TokenDescriptor},
    utils::{parse_address, GAS_LIMIT},
};

use super::Wallet;

/// Fee kept back when sweeping the native coin, as a multiple of a plain transfer.
const SWEEP_FEE_FACTOR: u64 = 2;

fn coin_amount(raw: U256) -> Balance {
    Balance::new(raw, COIN_DECIMALS, COIN_DISPLAY_DECIMALS)
}

fn approval_label(amount: U256, token: &TokenDescriptor) -> String {
    if amount == U256::MAX {
        "max".to_string()
    } else {
        Balance::new(amount, token.decimals, token.display_decimals).display()
    }
}

impl Wallet {
    pub async fn transfer_coin(&self, to: &str, amount: U256) -> Result<TxHash> {
        async {
            let to = parse_address(to)?;
            info!(
                "{} Sending {} {} to {}",
                self.info(),
                coin_amount(amount),
                COIN_SYMBOL,
                to
            );

            let tx = self
                .transactions
                .build_tx_to(&self.account, to, amount, Bytes::new())
                .await?;
            let hash = self.transactions.send_tx(&self.account, tx).await?;

            info!(
                "{} Successfully sent {} {} to {}",
                self.info(),
                coin_amount(amount),
                COIN_SYMBOL,
                to
            );
            Ok::<_, WalletError>(hash)
        }
        .await
        .context("failed to transfer coin")
    }

    /// Sends the whole coin balance minus twice the cost of a plain transfer.
    pub async fn transfer_all_coin(&self, to: &str) -> Result<TxHash> {
        async {
            let to = parse_address(to)?;
            let balance = self.get_coin_balance().await?;

            let tx = self
                .transactions
                .build_tx_to(&self.account, to, U256::ZERO, Bytes::new())
                .await?;
            let gas_price = U256::from(tx.gas_price.unwrap_or_default());
            let reserve = gas_price * U256::from(GAS_LIMIT) * U256::from(SWEEP_FEE_FACTOR);

            if balance.raw <= reserve {
                return Err(WalletError::InsufficientBalance(format!(
                    "{} {} does not cover the {} {} fee reserve",
                    balance,
                    COIN_SYMBOL,
                    coin_amount(reserve),
                    COIN_SYMBOL
                )));
            }
            let amount = balance.raw - reserve;

            info!(
                "{} Sending {} {} to {}",
                self.info(),
                coin_amount(amount),
                COIN_SYMBOL,
                to
            );
            let hash = self
                .transactions
                .send_tx(&self.account, tx.with_value(amount))
                .await?;

            info!(
                "{} Successfully sent {} {} to {}",
                self.info(),
                coin_amount(amount),
                COIN_SYMBOL,
                to
            );
            Ok::<_, WalletError>(hash)
        }
        .await
        .context("failed to transfer all coin")
    }

    pub async fn transfer_token(
        &self,
        token: &TokenDescriptor,
        to: &str,
        amount: U256,
    ) -> Result<TxHash> {
        async {
            let to = parse_address(to)?;
            let shown = Balance::new(amount, token.decimals, token.display_decimals);
            info!("{} Sending {} {} to {}", self.info(), shown, token.symbol, to);

            let hash = self.send_token_transfer(token, to, amount).await?;

            info!(
                "{} Successfully sent {} {} to {}",
                self.info(),
                shown,
                token.symbol,
                to
            );
            Ok::<_, WalletError>(hash)
        }
        .await
        .context("failed to transfer token")
    }

    /// Sends the whole token balance. Fees are paid in the native coin, so nothing is held back.
    pub async fn transfer_all_token(&self, token: &TokenDescriptor, to: &str) -> Result<TxHash> {
        async {
            let to = parse_address(to)?;
            let balance = self.get_token_balance(token).await?;
            if balance.is_zero() {
                return Err(WalletError::InsufficientBalance(format!(
                    "no {} to send",
                    token.symbol
                )));
            }

            info!(
                "{} Sending {} {} to {}",
                self.info(),
                balance,
                token.symbol,
                to
            );
            let hash = self.send_token_transfer(token, to, balance.raw).await?;

            info!(
                "{} Successfully sent {} {} to {}",
                self.info(),
                balance,
                token.symbol,
                to
            );
            Ok::<_, WalletError>(hash)
        }
        .await
        .with_context(|| format!("failed to transfer all {} token", token.symbol))
    }

    async fn send_token_transfer(
        &self,
        token: &TokenDescriptor,
        to: Address,
        amount: U256,
    ) -> Result<TxHash> {
        let payload = self.encoder.encode(&ContractCall::Transfer { to, amount });
        let tx = self
            .transactions
            .build_tx_to(&self.account, token.address, U256::ZERO, payload)
            .await?;
        self.transactions.send_tx(&self.account, tx).await
    }

    /// Approves `spender` for `amount` (unlimited when `None`) unless the
    /// current allowance already covers it.
    pub async fn approve(
        &self,
        token: &TokenDescriptor,
        spender: &str,
        amount: Option<U256>,
    ) -> Result<ApproveOutcome> {
        async {
            let spender = parse_address(spender)?;
            let amount = amount.unwrap_or(U256::MAX);

            let allowance = self.get_allowance(token, spender).await?;
            if allowance >= amount {
                info!(
                    "{} {} token approve already exists",
                    self.info(),
                    token.symbol
                );
                return Ok(ApproveOutcome::AlreadyApproved { allowance });
            }

            let label = approval_label(amount, token);
            info!(
                "{} Approving {} {} for {}",
                self.info(),
                label,
                token.symbol,
                spender
            );

            let payload = self
                .encoder
                .encode(&ContractCall::Approve { spender, amount });
            let tx = self
                .transactions
                .build_tx_to(&self.account, token.address, U256::ZERO, payload)
                .await?;
            let hash = self.transactions.send_tx(&self.account, tx).await?;

            info!(
                "{} Successfully approved {} {} for {}",
                self.info(),
                label,
                token.symbol,
                spender
            );
            Ok::<_, WalletError>(ApproveOutcome::Approved(hash))
        }
        .await
        .context("failed to approve")
    }

    /// Claims `quantity` NFTs from `drop` to this wallet, paying
    /// `price_per_token` (smallest unit) of `currency` each.
    pub async fn claim(
        &self,
        drop: Address,
        quantity: u64,
        currency: &TokenDescriptor,
        price_per_token: U256,
    ) -> Result<TxHash> {
        async {
            info!("{} Claiming {} NFTs...", self.info(), quantity);

            let payload = self.encoder.encode(&ContractCall::Claim {
                receiver: self.address(),
                quantity: U256::from(quantity),
                currency: currency.address,
                price_per_token,
            });
            let tx = self
                .transactions
                .build_tx_to(&self.account, drop, U256::ZERO, payload)
                .await?;
            let hash = self.transactions.send_tx(&self.account, tx).await?;

            info!("{} {} NFTs successfully claimed", self.info(), quantity);
            Ok::<_, WalletError>(hash)
        }
        .await
        .with_context(|| format!("failed to claim {} NFT", quantity))
    }
}
