use alloy::{
    network::TransactionBuilder,
    primitives::{Address, U256},
};
use alloy_rpc_types::TransactionRequest;

use crate::{
    config::{COIN_DECIMALS, COIN_DISPLAY_DECIMALS},
    encoder::ContractCall,
    error::{Result, ResultExt},
    types::{Balance, TokenDescriptor},
};

use super::Wallet;

impl Wallet {
    /// Native coin balance, queried fresh on every call.
    pub async fn get_coin_balance(&self) -> Result<Balance> {
        let raw = self
            .chain
            .get_balance(self.address())
            .await
            .context("failed to get native coin balance")?;
        Ok(Balance::new(raw, COIN_DECIMALS, COIN_DISPLAY_DECIMALS))
    }

    pub async fn get_token_balance(&self, token: &TokenDescriptor) -> Result<Balance> {
        let raw = self
            .read_uint(
                token.address,
                ContractCall::BalanceOf {
                    owner: self.address(),
                },
            )
            .await
            .with_context(|| format!("failed to get {} balance", token.symbol))?;
        Ok(Balance::new(raw, token.decimals, token.display_decimals))
    }

    /// Amount of `token` that `spender` may move on behalf of this wallet.
    pub async fn get_allowance(&self, token: &TokenDescriptor, spender: Address) -> Result<U256> {
        self.read_uint(
            token.address,
            ContractCall::Allowance {
                owner: self.address(),
                spender,
            },
        )
        .await
        .with_context(|| format!("failed to get {} allowance", token.symbol))
    }

    async fn read_uint(&self, contract: Address, call: ContractCall) -> Result<U256> {
        let request = TransactionRequest::default()
            .with_from(self.address())
            .with_to(contract)
            .with_input(self.encoder.encode(&call));
        let output = self.chain.call(request).await?;
        self.encoder.decode_uint(&output)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::WalletError,
        testing::{test_wallets, MockChain},
    };
    use alloy::primitives::U256;

    #[tokio::test]
    async fn reads_coin_and_token_balances() {
        let chain = MockChain::new();
        let wallet = &test_wallets(1, chain.clone())[0];
        let token = wallet.settings().token.clone();
        chain.set_coin_balance(wallet.address(), U256::from(1_500_000_000_000_000_000u128));
        chain.set_token_balance(token.address, wallet.address(), U256::from(42u8));

        let coin = wallet.get_coin_balance().await.unwrap();
        assert_eq!(coin.display(), "1.500000");

        let balance = wallet.get_token_balance(&token).await.unwrap();
        assert_eq!(balance.raw, U256::from(42u8));
        assert_eq!(balance.display(), "42");
    }

    #[tokio::test]
    async fn every_read_hits_the_chain() {
        let chain = MockChain::new();
        let wallet = &test_wallets(1, chain.clone())[0];
        let token = wallet.settings().token.clone();

        chain.set_token_balance(token.address, wallet.address(), U256::from(1u8));
        assert_eq!(wallet.get_token_balance(&token).await.unwrap().raw, U256::from(1u8));

        chain.set_token_balance(token.address, wallet.address(), U256::from(9u8));
        assert_eq!(wallet.get_token_balance(&token).await.unwrap().raw, U256::from(9u8));
    }

    #[tokio::test]
    async fn failures_are_tagged_with_symbol() {
        let chain = MockChain::new();
        let wallet = &test_wallets(1, chain.clone())[0];
        let token = wallet.settings().token.clone();
        chain.fail_token_reads(token.address);

        let err = wallet.get_token_balance(&token).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to get ASTR balance"));
        assert!(matches!(err.root(), WalletError::ProviderError(_)));
    }
}
