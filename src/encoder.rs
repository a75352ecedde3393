//! Contract-call payloads.
//!
//! The transaction pipeline only sees opaque bytes; which bytes a call turns
//! into is decided here, behind [`PayloadEncoder`].

use alloy::{
    primitives::{Address, Bytes, FixedBytes, U256},
    sol,
    sol_types::SolCall,
};

use crate::error::{Result, WalletError};

sol! {
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    interface IDrop {
        struct AllowlistProof {
            bytes32[] proof;
            uint256 quantityLimitPerWallet;
            uint256 pricePerToken;
            address currency;
        }

        function claim(
            address receiver,
            uint256 quantity,
            address currency,
            uint256 pricePerToken,
            AllowlistProof allowlistProof,
            bytes data
        ) external payable;
    }
}

/// A contract call the wallet can make, by operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    BalanceOf {
        owner: Address,
    },
    Allowance {
        owner: Address,
        spender: Address,
    },
    Transfer {
        to: Address,
        amount: U256,
    },
    Approve {
        spender: Address,
        amount: U256,
    },
    /// Public-phase drop claim paid in `currency`
    Claim {
        receiver: Address,
        quantity: U256,
        currency: Address,
        price_per_token: U256,
    },
}

pub trait PayloadEncoder: Send + Sync {
    fn encode(&self, call: &ContractCall) -> Bytes;

    /// Decodes the single `uint256` returned by a read call.
    fn decode_uint(&self, output: &[u8]) -> Result<U256> {
        if output.len() < 32 {
            return Err(WalletError::Encoding(format!(
                "expected a 32-byte word, got {} bytes",
                output.len()
            )));
        }
        Ok(U256::from_be_slice(&output[..32]))
    }
}

/// Solidity ABI encoding of [`ContractCall`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbiEncoder;

impl PayloadEncoder for AbiEncoder {
    fn encode(&self, call: &ContractCall) -> Bytes {
        let data = match call.clone() {
            ContractCall::BalanceOf { owner } => IERC20::balanceOfCall { owner }.abi_encode(),
            ContractCall::Allowance { owner, spender } => {
                IERC20::allowanceCall { owner, spender }.abi_encode()
            }
            ContractCall::Transfer { to, amount } => IERC20::transferCall { to, amount }.abi_encode(),
            ContractCall::Approve { spender, amount } => {
                IERC20::approveCall { spender, amount }.abi_encode()
            }
            ContractCall::Claim {
                receiver,
                quantity,
                currency,
                price_per_token,
            } => IDrop::claimCall {
                receiver,
                quantity,
                currency,
                pricePerToken: price_per_token,
                allowlistProof: IDrop::AllowlistProof {
                    proof: vec![FixedBytes::ZERO],
                    quantityLimitPerWallet: quantity,
                    pricePerToken: price_per_token,
                    currency,
                },
                data: Bytes::new(),
            }
            .abi_encode(),
        };
        data.into()
    }
}
