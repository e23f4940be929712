//! Bridge amount parsing and token amount formatting
//!
//! User input is validated once into a [`BridgeAmount`], a strictly positive
//! 18-decimal fixed-point value. Transactions only ever take a `BridgeAmount`,
//! so zero or unparseable input can never reach the chain.

use std::fmt;

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;

use crate::error::FlowError;

/// Decimals of the CHOM token
pub const TOKEN_DECIMALS: usize = 18;

/// Validated, strictly positive amount in the token's smallest unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BridgeAmount(U256);

impl BridgeAmount {
    /// Parse a decimal string such as `10`, `0.5` or `.25`.
    pub fn parse(input: &str) -> Result<Self, FlowError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FlowError::InvalidAmount("enter an amount".to_string()));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction)
        {
            return Err(FlowError::InvalidAmount(format!(
                "{:?} is not a decimal number",
                trimmed
            )));
        }
        if fraction.len() > TOKEN_DECIMALS {
            return Err(FlowError::InvalidAmount(format!(
                "at most {} decimal places are supported",
                TOKEN_DECIMALS
            )));
        }

        let normalized = match (whole.is_empty(), fraction.is_empty()) {
            (true, _) => format!("0.{}", fraction),
            (false, true) => whole.to_string(),
            (false, false) => format!("{}.{}", whole, fraction),
        };

        let wei = parse_ether(&normalized)
            .map_err(|e| FlowError::InvalidAmount(format!("{:?}: {}", trimmed, e)))?;

        Self::from_wei(wei)
    }

    /// Wrap an amount already in the smallest unit
    pub fn from_wei(wei: U256) -> Result<Self, FlowError> {
        if wei.is_zero() {
            return Err(FlowError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(Self(wei))
    }

    pub fn wei(&self) -> U256 {
        self.0
    }
}

impl fmt::Display for BridgeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_token_amount(self.0))
    }
}

impl std::str::FromStr for BridgeAmount {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Render an 18-decimal amount without trailing zeros (`10`, `0.5`).
pub fn format_token_amount(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => formatted,
    }
}

/// Destination-side preview of what the user typed
pub fn display_amount(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        "...".to_string()
    } else {
        trimmed.to_string()
    }
}
