//! Static configuration consumed by the swap relay core
//!
//! All structs deserialize with serde so callers can feed them from any source.
//! `from_env` helpers read environment variables (loading a `.env` file first
//! when present), following the same conventions as the operator binaries.

use alloy::primitives::Address;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::registry::decode_address;

/// `key_type` value selecting plaintext keys from configuration
pub const KEY_TYPE_LOCAL: &str = "local_private_key";
/// `key_type` value selecting a secrets-manager entry
pub const KEY_TYPE_AWS: &str = "aws_private_key";

/// Raw swap pair record as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwapPairConfig {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Base-10 minimum swap amount in token units
    pub low_bound: String,
    /// Base-10 maximum swap amount in token units
    pub upper_bound: String,
    /// Token address on chain A (the registry key)
    #[serde(alias = "erc20_addr")]
    pub source_token_address: String,
    /// Paired token address on chain B
    #[serde(alias = "bep20_addr")]
    pub destination_token_address: String,
}

impl SwapPairConfig {
    /// Parse a JSON array of pair records
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidValue {
            name: "swap pair list".to_string(),
            reason: e.to_string(),
        })
    }

    /// Load pair records from `SWAP_PAIRS_JSON`
    pub fn list_from_env() -> Result<Vec<Self>, ConfigError> {
        Self::list_from_json(&required_env("SWAP_PAIRS_JSON")?)
    }
}

/// Where signing credentials come from
#[derive(Deserialize)]
#[serde(tag = "key_type")]
pub enum KeyManagerConfig {
    /// Plaintext keys copied straight from configuration
    #[serde(rename = "local_private_key")]
    Local {
        local_hmac_key: SecretString,
        local_admin_api_key: SecretString,
        local_admin_secret_key: SecretString,
        local_chain_a_private_key: SecretString,
        local_chain_b_private_key: SecretString,
    },
    /// A single JSON secret stored in a secrets manager
    #[serde(rename = "aws_private_key")]
    Remote {
        aws_secret_name: String,
        aws_region: String,
    },
}

/// Custom Debug that never prints key material.
impl fmt::Debug for KeyManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyManagerConfig::Local { .. } => f
                .debug_struct("KeyManagerConfig::Local")
                .field("keys", &"<redacted>")
                .finish(),
            KeyManagerConfig::Remote {
                aws_secret_name,
                aws_region,
            } => f
                .debug_struct("KeyManagerConfig::Remote")
                .field("aws_secret_name", aws_secret_name)
                .field("aws_region", aws_region)
                .finish(),
        }
    }
}

impl KeyManagerConfig {
    /// The `key_type` discriminator this config was built from
    pub fn key_type(&self) -> &'static str {
        match self {
            KeyManagerConfig::Local { .. } => KEY_TYPE_LOCAL,
            KeyManagerConfig::Remote { .. } => KEY_TYPE_AWS,
        }
    }

    /// Load from environment variables
    ///
    /// `KEY_TYPE` selects the variant; anything other than `aws_private_key`
    /// reads the `LOCAL_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv(".env")?;

        let key_type = env::var("KEY_TYPE").unwrap_or_else(|_| KEY_TYPE_LOCAL.to_string());
        if key_type == KEY_TYPE_AWS {
            return Ok(KeyManagerConfig::Remote {
                aws_secret_name: required_env("AWS_SECRET_NAME")?,
                aws_region: required_env("AWS_REGION")?,
            });
        }

        Ok(KeyManagerConfig::Local {
            local_hmac_key: required_env("LOCAL_HMAC_KEY")?.into(),
            local_admin_api_key: required_env("LOCAL_ADMIN_API_KEY")?.into(),
            local_admin_secret_key: required_env("LOCAL_ADMIN_SECRET_KEY")?.into(),
            local_chain_a_private_key: required_env("LOCAL_CHAIN_A_PRIVATE_KEY")?.into(),
            local_chain_b_private_key: required_env("LOCAL_CHAIN_B_PRIVATE_KEY")?.into(),
        })
    }
}

/// Connection settings for one EVM chain
#[derive(Debug, Clone, Deserialize)]
pub struct EvmChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Swap agent contract on this chain
    #[serde(deserialize_with = "deserialize_address")]
    pub swap_agent_address: Address,
    /// Deadline applied to every RPC round-trip
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    /// Fold the chain id into signatures (EIP-155). Off keeps Homestead signatures.
    #[serde(default)]
    pub eip155: bool,
}

fn default_rpc_timeout_ms() -> u64 {
    10_000
}

fn deserialize_address<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
    let value = String::deserialize(deserializer)?;
    decode_address(&value).map_err(serde::de::Error::custom)
}

impl EvmChainConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Load from `{prefix}RPC_URL`, `{prefix}CHAIN_ID`, `{prefix}SWAP_AGENT_ADDRESS`,
    /// `{prefix}RPC_TIMEOUT_MS` and `{prefix}EIP155`, e.g. with prefix `CHAIN_A_`.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        load_dotenv(".env")?;

        let chain_id = parse_env(&format!("{}CHAIN_ID", prefix), "must be a valid u64")?;

        let agent_var = format!("{}SWAP_AGENT_ADDRESS", prefix);
        let swap_agent_address =
            decode_address(&required_env(&agent_var)?).map_err(|reason| {
                ConfigError::InvalidValue {
                    name: agent_var.clone(),
                    reason,
                }
            })?;

        Ok(Self {
            rpc_url: required_env(&format!("{}RPC_URL", prefix))?,
            chain_id,
            swap_agent_address,
            rpc_timeout_ms: optional_env(
                &format!("{}RPC_TIMEOUT_MS", prefix),
                "must be a valid u64 in milliseconds",
            )?
            .unwrap_or_else(default_rpc_timeout_ms),
            eip155: optional_env(&format!("{}EIP155", prefix), "must be true or false")?
                .unwrap_or(false),
        })
    }
}

fn load_dotenv(path: &str) -> Result<(), ConfigError> {
    if Path::new(path).exists() {
        dotenvy::from_filename(path).map_err(|e| ConfigError::InvalidValue {
            name: path.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
}

fn parse_env<T: FromStr>(name: &str, expected: &str) -> Result<T, ConfigError> {
    parse_value(name, &required_env(name)?, expected)
}

/// `None` only when the variable is unset; a value that fails to parse is an error
fn optional_env<T: FromStr>(name: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_value(name, &value, expected).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "not valid unicode".to_string(),
        }),
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str, expected: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: expected.to_string(),
    })
}
