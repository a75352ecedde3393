//! Utility functions for wallet operations.
//!
//! This module provides helper functions for:
//! - Address validation
//! - Amount conversion
//! - Key file handling and wallet generation
//! - Randomized pauses between wallets

use std::{collections::HashSet, io::Write, path::Path, time::Duration};

use alloy::{
    primitives::{Address, U256},
    signers::local::PrivateKeySigner,
};
use alloy_primitives::utils::parse_units;
use tracing::info;

use crate::{
    config::RandomRange,
    error::{Result, WalletError},
};

/// Standard gas limit for basic ETH transfer transactions
pub const GAS_LIMIT: u64 = 21000;

/// Whether `address` is a 20-byte hex address (checksum not enforced).
pub fn is_valid_address(address: &str) -> bool {
    let address = address.trim();
    address.len() == 42 && address.starts_with("0x") && address.parse::<Address>().is_ok()
}

pub fn parse_address(address: &str) -> Result<Address> {
    if !is_valid_address(address) {
        return Err(WalletError::InvalidAddress(address.to_string()));
    }
    address
        .trim()
        .parse()
        .map_err(|_| WalletError::InvalidAddress(address.to_string()))
}

/// Converts a decimal amount into the token's smallest unit.
pub fn to_raw_amount(amount: f64, decimals: u8) -> Result<U256> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(WalletError::Encoding(format!("invalid amount {}", amount)));
    }
    let precision = decimals.min(9) as usize;
    let rendered = format!("{:.*}", precision, amount);
    parse_units(&rendered, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| WalletError::Encoding(format!("failed to convert {}: {}", rendered, e)))
}

/// Sleeps for a duration drawn from `range`, logging it under `info`.
pub async fn sleep_random(range: &RandomRange, info: &str) -> Duration {
    let duration = Duration::from_millis(range.sample_duration().as_millis() as u64);
    info!(
        "{} Sleeping for {}",
        info,
        humantime::format_duration(duration)
    );
    tokio::time::sleep(duration).await;
    duration
}

/// Reads one key per line, trimming whitespace and skipping blank lines.
pub fn load_private_keys(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Drops repeated keys, keeping first occurrences in order. Returns the number dropped.
pub fn dedup_keys(keys: Vec<String>) -> (Vec<String>, usize) {
    let mut seen = HashSet::new();
    let total = keys.len();
    let unique: Vec<String> = keys
        .into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect();
    let duplicates = total - unique.len();
    (unique, duplicates)
}

pub fn append_private_keys(path: &Path, keys: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    for key in keys {
        writeln!(file, "{}", key)?;
    }
    Ok(())
}

/// Generates `count` random private keys as 0x-prefixed hex.
pub fn generate_private_keys(count: usize) -> Vec<String> {
    (0..count)
        .map(|_| PrivateKeySigner::random().to_bytes().to_string())
        .collect()
}

/// Resolves a selection such as `all`, `3`, `1,2,5` or `2-4` to 0-based positions.
pub fn parse_selection(input: &str, total: usize) -> Result<Vec<usize>> {
    let input = input.trim();
    let invalid = || WalletError::Config(format!("invalid wallet selection '{}'", input));

    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return Ok((0..total).collect());
    }

    let position = |raw: &str| -> Result<usize> {
        let index: usize = raw.trim().parse().map_err(|_| invalid())?;
        if index == 0 || index > total {
            return Err(invalid());
        }
        Ok(index - 1)
    };

    if let Some((start, end)) = input.split_once('-') {
        let (start, end) = (position(start)?, position(end)?);
        if start > end {
            return Err(invalid());
        }
        return Ok((start..=end).collect());
    }

    input.split(',').map(position).collect()
}
