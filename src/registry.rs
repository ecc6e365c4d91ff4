//! Swap pair registry
//!
//! Turns raw pair configuration into validated, immutable records keyed by the
//! chain-A token address. Built once at startup.

use alloy::primitives::{Address, U256};
use std::collections::HashMap;
use tracing::info;

use crate::config::SwapPairConfig;
use crate::error::ConfigError;

/// A validated swap pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPairRecord {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub low_bound: U256,
    pub upper_bound: U256,
    /// Token on chain A
    pub source_token_address: Address,
    /// Paired token on chain B
    pub destination_token_address: Address,
}

impl SwapPairRecord {
    /// Validate one raw record
    pub fn from_config(pair: &SwapPairConfig) -> Result<Self, ConfigError> {
        let low_bound = parse_bound(&pair.symbol, "lowBound", &pair.low_bound)?;
        let upper_bound = parse_bound(&pair.symbol, "upperBound", &pair.upper_bound)?;
        if low_bound > upper_bound {
            return Err(ConfigError::InvertedBounds {
                symbol: pair.symbol.clone(),
                low: low_bound.to_string(),
                upper: upper_bound.to_string(),
            });
        }

        Ok(Self {
            symbol: pair.symbol.clone(),
            name: pair.name.clone(),
            decimals: pair.decimals,
            low_bound,
            upper_bound,
            source_token_address: parse_address(
                &pair.symbol,
                "sourceTokenAddress",
                &pair.source_token_address,
            )?,
            destination_token_address: parse_address(
                &pair.symbol,
                "destinationTokenAddress",
                &pair.destination_token_address,
            )?,
        })
    }

    /// Whether `amount` lies within `[low_bound, upper_bound]`
    pub fn accepts_amount(&self, amount: U256) -> bool {
        amount >= self.low_bound && amount <= self.upper_bound
    }
}

/// Validated pairs keyed by source (chain A) token address
#[derive(Debug, Clone, Default)]
pub struct SwapPairRegistry {
    pairs: HashMap<Address, SwapPairRecord>,
}

impl SwapPairRegistry {
    /// Build the registry from raw configuration.
    ///
    /// The first malformed record aborts the whole build, so a partial registry
    /// is never returned. Duplicate source addresses are not an error: the last
    /// entry wins.
    pub fn build(pairs: &[SwapPairConfig]) -> Result<Self, ConfigError> {
        let mut records = HashMap::with_capacity(pairs.len());

        for pair in pairs {
            let record = SwapPairRecord::from_config(pair)?;

            info!(
                symbol = %record.symbol,
                name = %record.name,
                source_token = %record.source_token_address,
                destination_token = %record.destination_token_address,
                "Load swap pair"
            );

            records.insert(record.source_token_address, record);
        }

        Ok(Self { pairs: records })
    }

    pub fn get(&self, source_token: &Address) -> Option<&SwapPairRecord> {
        self.pairs.get(source_token)
    }

    pub fn contains(&self, source_token: &Address) -> bool {
        self.pairs.contains_key(source_token)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &SwapPairRecord)> {
        self.pairs.iter()
    }
}

/// Parse a base-10 non-negative integer that fits in a uint256
///
/// Bounds are compared against on-chain `uint256` amounts, so a value above
/// 2^256 - 1 is rejected as [`ConfigError::InvalidBound`] rather than kept at
/// arbitrary precision.
fn parse_bound(symbol: &str, field: &'static str, value: &str) -> Result<U256, ConfigError> {
    let invalid = || ConfigError::InvalidBound {
        symbol: symbol.to_string(),
        field,
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    U256::from_str_radix(value, 10).map_err(|_| invalid())
}

/// Parse a pair's 20-byte hex address field
pub(crate) fn parse_address(
    symbol: &str,
    field: &'static str,
    value: &str,
) -> Result<Address, ConfigError> {
    decode_address(value).map_err(|reason| ConfigError::InvalidAddress {
        symbol: symbol.to_string(),
        field,
        reason,
    })
}

/// Decode a 20-byte hex address, case-insensitive, `0x`/`0X` prefix optional
pub(crate) fn decode_address(value: &str) -> Result<Address, String> {
    let hex_str = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if hex_str.len() != 40 {
        return Err(format!("expected 40 hex chars, got {}", hex_str.len()));
    }

    let bytes = hex::decode(hex_str).map_err(|e| e.to_string())?;
    Ok(Address::from_slice(&bytes))
}
