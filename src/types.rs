//! Core type definitions for wallet operations.
//!
//! This module contains the values passed between the balance reader, the
//! transaction pipeline and the execution strategies.

use alloy::primitives::{Address, TxHash, U256};
use core::fmt;
use serde::Deserialize;
use std::fmt::Display;

/// Static description of an ERC-20 style token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TokenDescriptor {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    /// Number of fractional digits used when logging amounts
    pub display_decimals: u8,
}

impl TokenDescriptor {
    pub fn new(address: Address, symbol: &str, decimals: u8, display_decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            decimals,
            display_decimals,
        }
    }
}

/// A balance as read from chain. Never cached: every query builds a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    /// Amount in the smallest unit
    pub raw: U256,
    pub decimals: u8,
    pub display_decimals: u8,
}

impl Balance {
    pub fn new(raw: U256, decimals: u8, display_decimals: u8) -> Self {
        Self {
            raw,
            decimals,
            display_decimals,
        }
    }

    /// Exact decimal value, `raw / 10^decimals`, with every fractional digit.
    pub fn decimal(&self) -> String {
        format_fixed(self.raw, self.decimals, self.decimals)
    }

    /// Decimal value rounded half-up to `display_decimals` digits.
    pub fn display(&self) -> String {
        format_fixed(self.raw, self.decimals, self.display_decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}

/// Renders `raw / 10^decimals` with exactly `precision` fractional digits.
pub fn format_fixed(raw: U256, decimals: u8, precision: u8) -> String {
    let scaled = if precision < decimals {
        let divisor = pow10(decimals - precision);
        raw.saturating_add(divisor / U256::from(2u8)) / divisor
    } else {
        raw.saturating_mul(pow10(precision - decimals))
    };

    if precision == 0 {
        return scaled.to_string();
    }

    let unit = pow10(precision);
    let fraction = (scaled % unit).to_string();
    format!(
        "{}.{:0>width$}",
        scaled / unit,
        fraction,
        width = precision as usize
    )
}

/// Steps of a single submission, used to tag where a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Building,
    Estimating,
    Signing,
    Broadcasting,
    Pending,
}

impl Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            TxStage::Building => "building",
            TxStage::Estimating => "estimating gas",
            TxStage::Signing => "signing",
            TxStage::Broadcasting => "broadcasting",
            TxStage::Pending => "waiting for receipt",
        };
        f.write_str(stage)
    }
}

/// Terminal state of one `send_tx` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed(TxHash),
    Reverted(TxHash),
    NotFoundTimeout(TxHash),
    SubmissionError { stage: TxStage, reason: String },
}

/// Answer of a receipt query, classified at the RPC boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptLookup {
    Found { success: bool },
    /// The node does not know the hash yet
    NotIndexedYet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApproveOutcome {
    AlreadyApproved { allowance: U256 },
    Approved(TxHash),
}

/// One row of a balance snapshot.
#[derive(Debug, Clone)]
pub struct BalanceRecord {
    pub index: usize,
    pub address: Address,
    pub coin: Balance,
    pub token: Balance,
    pub nft: Option<Balance>,
}

/// What a strategy did with a set of wallets.
#[derive(Debug, Default, Clone)]
pub struct ExecutionReport {
    /// Wallet indices per group, in the order the groups ran
    pub groups: Vec<Vec<usize>>,
    pub succeeded: Vec<usize>,
    /// Wallet index and rendered error of every failed task
    pub failed: Vec<(usize, String)>,
    /// Number of sleeps taken between groups
    pub pauses: usize,
}

impl ExecutionReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_is_raw_over_power_of_ten() {
        let balance = Balance::new(U256::from(1_234_500_000_000_000_000u128), 18, 2);
        assert_eq!(balance.decimal(), "1.234500000000000000");
        assert_eq!(balance.display(), "1.23");

        let whole = Balance::new(U256::from(7u8), 0, 0);
        assert_eq!(whole.decimal(), "7");
        assert_eq!(whole.display(), "7");
    }

    #[test]
    fn display_rounds_half_up() {
        assert_eq!(Balance::new(U256::from(125u16), 2, 1).display(), "1.3");
        assert_eq!(Balance::new(U256::from(124u16), 2, 1).display(), "1.2");
        assert_eq!(Balance::new(U256::from(5u8), 3, 6).display(), "0.005000");
    }

    #[test]
    fn formatting_never_touches_raw_amount() {
        for decimals in [0u8, 1, 6, 18] {
            for raw in [0u64, 1, 9, 10, 999_999, u64::MAX] {
                let balance = Balance::new(U256::from(raw), decimals, 2);
                let _ = balance.display();
                let _ = balance.decimal();
                assert_eq!(balance.raw, U256::from(raw));
                let digits: String = balance.decimal().chars().filter(|c| *c != '.').collect();
                assert_eq!(digits.parse::<U256>().unwrap(), U256::from(raw));
            }
        }
    }

    #[test]
    fn report_counts_both_outcomes() {
        let report = ExecutionReport {
            succeeded: vec![1, 3],
            failed: vec![(2, "boom".to_string())],
            ..Default::default()
        };
        assert_eq!(report.total(), 3);
    }
}
