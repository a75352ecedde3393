//! Jobs that apply a wallet action across the selected wallets.

use alloy::primitives::U256;
use futures::{future::BoxFuture, FutureExt};
use tracing::info;

use crate::{
    config::{RandomRange, Settings, COIN_DECIMALS},
    error::{Result, ResultExt, WalletError},
    types::{ExecutionReport, TokenDescriptor},
    utils::{parse_address, to_raw_amount},
    wallet::{
        execution::{ExecutionStrategy, SequentialStrategy},
        Wallet,
    },
};

/// Which balances a job touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Asset {
    Coin,
    Token,
    Both,
}

impl Asset {
    fn includes_coin(self) -> bool {
        matches!(self, Asset::Coin | Asset::Both)
    }

    fn includes_token(self) -> bool {
        matches!(self, Asset::Token | Asset::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClaimMode {
    /// Only approve the payment token for the drop contract
    Approve,
    /// Only claim
    Claim,
    /// Approve, then claim
    All,
}

/// Sweeps balances above the configured minimums into `receiver`.
///
/// The receiver's own wallet is left out. Tokens are swept before the coin so
/// the coin sweep sees the balance left after paying the token transfer.
pub async fn collect(
    wallets: &[Wallet],
    strategy: &dyn ExecutionStrategy,
    settings: &Settings,
    receiver: &str,
    asset: Asset,
) -> Result<ExecutionReport> {
    let receiver_address = parse_address(receiver)?;
    let token = settings.token.clone();
    let min_coin = to_raw_amount(settings.collector_min_coin_amount, COIN_DECIMALS)?;
    let min_token = to_raw_amount(settings.collector_min_token_amount, token.decimals)?;

    let senders: Vec<Wallet> = wallets
        .iter()
        .filter(|wallet| wallet.address() != receiver_address)
        .cloned()
        .collect();

    let receiver = receiver.to_string();
    let task = move |wallet: Wallet| -> BoxFuture<'static, Result<()>> {
        let token = token.clone();
        let receiver = receiver.clone();
        async move {
            if asset.includes_token() {
                let balance = wallet.get_token_balance(&token).await?;
                if balance.raw > min_token {
                    wallet.transfer_all_token(&token, &receiver).await?;
                } else {
                    info!(
                        "{} {} {} is below the minimum, skipping",
                        wallet.info(),
                        balance,
                        token.symbol
                    );
                }
            }
            if asset.includes_coin() {
                let balance = wallet.get_coin_balance().await?;
                if balance.raw > min_coin {
                    wallet.transfer_all_coin(&receiver).await?;
                } else {
                    info!("{} {} coin is below the minimum, skipping", wallet.info(), balance);
                }
            }
            Ok(())
        }
        .boxed()
    };

    Ok(strategy.run(&senders, &task).await)
}

/// Sends a random amount from wallet `sender_index` to every other wallet in `wallets`.
///
/// Always sequential: every transfer comes from the same account. Failures
/// carry the sender's identity and the receiving address.
pub async fn multi_send(
    wallets: &[Wallet],
    settings: &Settings,
    sender_index: usize,
    asset: Asset,
) -> Result<ExecutionReport> {
    if wallets.len() < 2 {
        return Err(WalletError::Config("add at least two wallets".to_string()));
    }
    let sender = wallets
        .iter()
        .find(|wallet| wallet.index() == sender_index)
        .cloned()
        .ok_or_else(|| {
            WalletError::Config(format!("wallet #{} is not in the selection", sender_index))
        })?;
    let receivers: Vec<Wallet> = wallets
        .iter()
        .filter(|wallet| wallet.address() != sender.address())
        .cloned()
        .collect();

    let token = settings.token.clone();
    let coin_range = settings.multisend_coin_amount;
    let token_range = settings.multisend_token_amount;

    let task = move |receiver: Wallet| -> BoxFuture<'static, Result<()>> {
        let sender = sender.clone();
        let token = token.clone();
        async move {
            let to = receiver.address().to_string();
            async {
                if asset.includes_coin() {
                    let amount = random_amount(&coin_range, COIN_DECIMALS)?;
                    sender.transfer_coin(&to, amount).await?;
                }
                if asset.includes_token() {
                    let amount = random_amount(&token_range, token.decimals)?;
                    sender.transfer_token(&token, &to, amount).await?;
                }
                Ok::<_, WalletError>(())
            }
            .await
            .with_context(|| format!("{} -> {}", sender.info(), to))
        }
        .boxed()
    };

    Ok(SequentialStrategy::new(settings.sleep_time)
        .run(&receivers, &task)
        .await)
}

fn random_amount(range: &RandomRange, decimals: u8) -> Result<U256> {
    to_raw_amount(range.sample(), decimals)
}

/// Approves and/or claims NFTs from the configured drop for every wallet.
pub async fn claim_nfts(
    wallets: &[Wallet],
    strategy: &dyn ExecutionStrategy,
    settings: &Settings,
    mode: ClaimMode,
) -> Result<ExecutionReport> {
    let drop = settings.nft_address;
    let spender = drop.to_string();
    let quantity = settings.claim_nft_amount;
    let currency: TokenDescriptor = settings.token.clone();
    let price = to_raw_amount(settings.nft_price, currency.decimals)?;

    let task = move |wallet: Wallet| -> BoxFuture<'static, Result<()>> {
        let currency = currency.clone();
        let spender = spender.clone();
        async move {
            if matches!(mode, ClaimMode::Approve | ClaimMode::All) {
                wallet.approve(&currency, &spender, None).await?;
            }
            if matches!(mode, ClaimMode::Claim | ClaimMode::All) {
                wallet.claim(drop, quantity, &currency, price).await?;
            }
            Ok(())
        }
        .boxed()
    };

    Ok(strategy.run(wallets, &task).await)
}

/// Each wallet sends itself a dust amount, pushing a stuck nonce forward.
pub async fn unbug(
    wallets: &[Wallet],
    strategy: &dyn ExecutionStrategy,
) -> Result<ExecutionReport> {
    let range = RandomRange::new(0.000001, 0.00001)?;

    let task = move |wallet: Wallet| -> BoxFuture<'static, Result<()>> {
        async move {
            let amount = random_amount(&range, COIN_DECIMALS)?;
            let own = wallet.address().to_string();
            wallet.transfer_coin(&own, amount).await?;
            Ok(())
        }
        .boxed()
    };

    Ok(strategy.run(wallets, &task).await)
}
