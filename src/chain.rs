//! Network boundary: the JSON-RPC calls the wallet pipeline relies on.

use std::sync::Arc;

use alloy::{
    network::Ethereum,
    primitives::{Address, Bytes, TxHash, U256},
    providers::{Provider, ProviderBuilder},
};
use alloy_json_rpc::ErrorPayload;
use alloy_rpc_types::TransactionRequest;
use alloy_transport::RpcError;
use async_trait::async_trait;

use crate::{
    error::{Result, WalletError},
    types::ReceiptLookup,
};

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Read-only contract call against the latest block.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;

    async fn get_gas_price(&self) -> Result<u128>;

    /// Transaction count including transactions still in the mempool.
    async fn get_pending_nonce(&self, address: Address) -> Result<u64>;

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash>;

    async fn get_receipt(&self, hash: TxHash) -> Result<ReceiptLookup>;
}

/// [`ChainClient`] backed by an alloy provider.
pub struct RpcClient {
    provider: Arc<dyn Provider<Ethereum>>,
}

impl RpcClient {
    pub fn new(provider: Arc<dyn Provider<Ethereum>>) -> Self {
        Self { provider }
    }

    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to connect: {}", e)))?;
        Ok(Self::new(Arc::new(provider)))
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to get chain ID: {}", e)))
    }
}

/// Some nodes answer an unknown hash with an error instead of `null`.
fn is_not_found(payload: &ErrorPayload) -> bool {
    payload.message.to_lowercase().contains("not found")
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to get balance: {}", e)))
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        self.provider
            .call(tx)
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to call contract: {}", e)))
    }

    async fn get_gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to get gas price: {}", e)))
    }

    async fn get_pending_nonce(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to get nonce: {}", e)))
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(tx)
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to estimate gas: {}", e)))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| WalletError::ProviderError(format!("Failed to send transaction: {}", e)))?;
        Ok(*pending.tx_hash())
    }

    async fn get_receipt(&self, hash: TxHash) -> Result<ReceiptLookup> {
        match self.provider.get_transaction_receipt(hash).await {
            Ok(Some(receipt)) => Ok(ReceiptLookup::Found {
                success: receipt.status(),
            }),
            Ok(None) => Ok(ReceiptLookup::NotIndexedYet),
            Err(RpcError::ErrorResp(payload)) if is_not_found(&payload) => {
                Ok(ReceiptLookup::NotIndexedYet)
            }
            Err(e) => Err(WalletError::ProviderError(format!(
                "Failed to get transaction receipt: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_payloads_are_recognised() {
        let payload: ErrorPayload =
            serde_json::from_str(r#"{"code":-32000,"message":"transaction not found"}"#).unwrap();
        assert!(is_not_found(&payload));

        let payload: ErrorPayload =
            serde_json::from_str(r#"{"code":-32000,"message":"Not Found"}"#).unwrap();
        assert!(is_not_found(&payload));

        let payload: ErrorPayload =
            serde_json::from_str(r#"{"code":-32005,"message":"rate limited"}"#).unwrap();
        assert!(!is_not_found(&payload));
    }
}
