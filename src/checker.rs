//! Balance snapshot across all wallets.

use futures::future;
use tracing::{info, info_span, warn};

use crate::{
    config::COIN_SYMBOL,
    error::{Result, ResultExt},
    types::BalanceRecord,
    wallet::Wallet,
};

async fn check_wallet(wallet: &Wallet) -> Result<BalanceRecord> {
    let settings = wallet.settings();
    let coin = wallet.get_coin_balance().await?;
    let token = wallet.get_token_balance(&settings.token).await?;
    let nft = match wallet.get_token_balance(&settings.nft_token()).await {
        Ok(balance) => Some(balance),
        Err(e) => {
            warn!("{} {}", wallet.info(), e);
            None
        }
    };

    Ok(BalanceRecord {
        index: wallet.index(),
        address: wallet.address(),
        coin,
        token,
        nft,
    })
}

/// Queries every wallet concurrently and returns rows in wallet order.
pub async fn check_balances(wallets: &[Wallet]) -> Result<Vec<BalanceRecord>> {
    let records = future::try_join_all(wallets.iter().map(|wallet| async move {
        check_wallet(wallet)
            .await
            .with_context(|| wallet.info().to_string())
    }))
    .await?;

    let span = info_span!("balances");
    let _guard = span.enter();
    let symbol = wallets
        .first()
        .map(|wallet| wallet.settings().token.symbol.clone())
        .unwrap_or_default();
    for record in &records {
        info!(
            index = record.index,
            address = %record.address,
            "{} {} | {} {} | {} NFT",
            record.coin,
            COIN_SYMBOL,
            record.token,
            symbol,
            record
                .nft
                .map(|nft| nft.display())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(records)
}
