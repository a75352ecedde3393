//! Process-wide settings.
//!
//! Loaded once at startup from a JSON file, with `.env` overrides for the
//! endpoint and keys location, then shared read-only behind an `Arc`.

use std::{path::Path, time::Duration};

use alloy::primitives::{address, Address};
use serde::Deserialize;

use crate::{
    error::{Result, WalletError},
    types::TokenDescriptor,
};

pub const DEFAULT_SETTINGS_PATH: &str = "data/settings.json";
pub const DEFAULT_KEYS_PATH: &str = "data/keys.txt";

/// Symbol and precision used for the chain's native coin.
pub const COIN_SYMBOL: &str = "ETH";
pub const COIN_DECIMALS: u8 = 18;
pub const COIN_DISPLAY_DECIMALS: u8 = 6;

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "[f64; 2]")]
pub struct RandomRange {
    min: f64,
    max: f64,
}

impl RandomRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return Err(WalletError::Config(format!(
                "range [{}, {}] must be finite, non-negative and ordered",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Fixed value; handy for deterministic runs.
    pub fn fixed(value: f64) -> Result<Self> {
        Self::new(value, value)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn sample(&self) -> f64 {
        if self.min == self.max {
            return self.min;
        }
        rand::random_range(self.min..=self.max)
    }

    pub fn sample_duration(&self) -> Duration {
        Duration::from_secs_f64(self.sample())
    }
}

impl TryFrom<[f64; 2]> for RandomRange {
    type Error = WalletError;

    fn try_from([min, max]: [f64; 2]) -> Result<Self> {
        Self::new(min, max)
    }
}

/// How a job fans out over the selected wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Concurrent groups of `BATCH_SIZE`
    Batch,
    /// One wallet after another
    Chain,
}

fn default_receipt_timeout() -> u64 {
    45
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_token() -> TokenDescriptor {
    TokenDescriptor::new(
        address!("0x2CAE934a1e84F693fbb78CA5ED3B0A6893259441"),
        "ASTR",
        18,
        2,
    )
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    pub rpc_url: String,
    pub chain_id: u64,
    pub gas_multiplier: RandomRange,
    #[serde(alias = "SLEEP_BETWEEN_WALLETS")]
    pub sleep_time: RandomRange,
    pub batch_size: usize,
    pub mode: ExecutionMode,
    pub multisend_coin_amount: RandomRange,
    pub multisend_token_amount: RandomRange,
    pub claim_nft_amount: u64,
    pub nft_address: Address,
    /// Price per NFT in whole payment tokens
    pub nft_price: f64,
    pub collector_min_coin_amount: f64,
    pub collector_min_token_amount: f64,
    #[serde(default = "default_token")]
    pub token: TokenDescriptor,
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub receipt_poll_interval_ms: u64,
}

impl Settings {
    /// Reads and validates the settings file. This should be called only once during startup.
    pub fn load(path: &Path) -> Result<Self> {
        dotenv::dotenv().ok();

        let raw = std::fs::read_to_string(path).map_err(|e| {
            WalletError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut settings = Self::from_json(&raw)?;

        if let Ok(rpc_url) = dotenv::var("RPC_URL") {
            settings.rpc_url = rpc_url;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| WalletError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(WalletError::Config("RPC_URL must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(WalletError::Config(
                "BATCH_SIZE must be greater than 0".to_string(),
            ));
        }
        if self.gas_multiplier.min() == 0.0 {
            return Err(WalletError::Config(
                "GAS_MULTIPLIER must be positive".to_string(),
            ));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(WalletError::Config(
                "RECEIPT_POLL_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    /// NFT contract seen as a token with no fractional part, for balance reads.
    pub fn nft_token(&self) -> TokenDescriptor {
        TokenDescriptor::new(self.nft_address, "NFT", 0, 0)
    }
}

/// Location of the keys file, `KEYS_PATH` from the environment if set.
pub fn keys_path_from_env() -> String {
    dotenv::var("KEYS_PATH").unwrap_or_else(|_| DEFAULT_KEYS_PATH.to_string())
}

#[cfg(test)]
pub(crate) fn test_settings() -> Settings {
    Settings {
        rpc_url: "http://localhost:8545".to_string(),
        chain_id: 31337,
        gas_multiplier: RandomRange::fixed(1.0).unwrap(),
        sleep_time: RandomRange::new(1.0, 3.0).unwrap(),
        batch_size: 2,
        mode: ExecutionMode::Batch,
        multisend_coin_amount: RandomRange::new(0.001, 0.002).unwrap(),
        multisend_token_amount: RandomRange::new(1.0, 2.0).unwrap(),
        claim_nft_amount: 1,
        nft_address: address!("0x00000000000000000000000000000000000000aa"),
        nft_price: 10.0,
        collector_min_coin_amount: 0.0001,
        collector_min_token_amount: 1.0,
        token: TokenDescriptor::new(
            address!("0x00000000000000000000000000000000000000bb"),
            "ASTR",
            0,
            0,
        ),
        receipt_timeout_secs: 45,
        receipt_poll_interval_ms: 1000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "RPC_URL": "https://rpc.soneium.org",
        "CHAIN_ID": 1868,
        "GAS_MULTIPLIER": [1.1, 1.3],
        "SLEEP_BETWEEN_WALLETS": [5, 10],
        "BATCH_SIZE": 5,
        "MODE": "chain",
        "MULTISEND_COIN_AMOUNT": [0.0001, 0.0002],
        "MULTISEND_TOKEN_AMOUNT": [1, 2],
        "CLAIM_NFT_AMOUNT": 2,
        "NFT_ADDRESS": "0x00000000000000000000000000000000000000aa",
        "NFT_PRICE": 10,
        "COLLECTOR_MIN_COIN_AMOUNT": 0.0001,
        "COLLECTOR_MIN_TOKEN_AMOUNT": 1
    }"#;

    #[test]
    fn parses_settings_with_legacy_sleep_key_and_defaults() {
        let settings = Settings::from_json(SAMPLE).unwrap();
        settings.validate().unwrap();

        assert_eq!(settings.mode, ExecutionMode::Chain);
        assert_eq!(settings.sleep_time, RandomRange::new(5.0, 10.0).unwrap());
        assert_eq!(settings.token.symbol, "ASTR");
        assert_eq!(settings.receipt_timeout(), Duration::from_secs(45));
        assert_eq!(settings.receipt_poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_inverted_ranges_and_empty_batches() {
        let inverted = SAMPLE.replace("[1.1, 1.3]", "[1.3, 1.1]");
        assert!(matches!(
            Settings::from_json(&inverted),
            Err(WalletError::Config(_))
        ));

        let zero_batch = SAMPLE.replace("\"BATCH_SIZE\": 5", "\"BATCH_SIZE\": 0");
        let settings = Settings::from_json(&zero_batch).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn samples_stay_inside_range() {
        let range = RandomRange::new(0.5, 1.0).unwrap();
        for _ in 0..100 {
            let value = range.sample();
            assert!((0.5..=1.0).contains(&value));
        }
        assert_eq!(RandomRange::fixed(2.0).unwrap().sample(), 2.0);
    }

    #[test]
    fn fixed_values_are_validated_like_ranges() {
        assert!(RandomRange::fixed(-1.0).is_err());
        assert!(RandomRange::fixed(f64::NAN).is_err());
        assert_eq!(
            RandomRange::fixed(0.0).unwrap().sample_duration(),
            Duration::ZERO
        );
    }
}
