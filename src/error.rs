//! Error types for swap transaction construction
//!
//! Each concern has its own enum so callers can decide on abort/alert/retry
//! policy per failure class. Nothing in this crate substitutes a default for a
//! failed parse or estimate: every failure is returned to the caller.

use std::time::Duration;
use thiserror::Error;

/// Malformed static input. The process should not start with it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {field} amount for pair {symbol}: {value:?}")]
    InvalidBound {
        symbol: String,
        field: &'static str,
        value: String,
    },

    #[error("lowBound {low} exceeds upperBound {upper} for pair {symbol}")]
    InvertedBounds {
        symbol: String,
        low: String,
        upper: String,
    },

    #[error("invalid {field} for pair {symbol}: {reason}")]
    InvalidAddress {
        symbol: String,
        field: &'static str,
        reason: String,
    },

    #[error("{0} environment variable is required")]
    MissingEnv(String),

    #[error("{name} is invalid: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Credential resolution failed. Fatal at startup; never retried here.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to fetch secret {name} in {region}: {reason}")]
    SecretFetch {
        name: String,
        region: String,
        reason: String,
    },

    #[error("fetching secret {name} in {region} timed out after {timeout:?}")]
    SecretTimeout {
        name: String,
        region: String,
        timeout: Duration,
    },

    /// The error text from serde is kept out of the message on purpose: it can
    /// echo fragments of the secret payload.
    #[error("secret {name} is not a valid credential document (line {line}, column {column})")]
    SecretFormat {
        name: String,
        line: usize,
        column: usize,
    },
}

/// The arguments do not fit the function registered in the ABI descriptor.
/// This is a programming or schema defect, not a data error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiEncodeError {
    #[error("function {function} is not part of ABI {abi}")]
    UnknownFunction { abi: String, function: String },

    #[error("arguments do not match {function} in ABI {abi}: {reason}")]
    ArgumentMismatch {
        abi: String,
        function: String,
        reason: String,
    },

    #[error("failed to decode call data against ABI {abi}: {reason}")]
    Decode { abi: String, reason: String },

    #[error("invalid ABI descriptor {abi}: {reason}")]
    InvalidDescriptor { abi: String, reason: String },
}

/// Transaction assembly failed. No signed artifact exists when this is returned.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{operation} failed: {reason}")]
    Rpc {
        operation: &'static str,
        reason: String,
    },

    /// The simulated call failed, typically a revert. No fee has been spent.
    #[error("failed to estimate gas needed: {reason}")]
    GasEstimation { reason: String },

    #[error("signing failed: {reason}")]
    Signing { reason: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

/// The registration receipt does not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected tx logs length in receipt is 2, actual it is {0}")]
    UnexpectedLogCount(usize),

    #[error("log {index} is not a {event} event: {reason}")]
    Decode {
        index: usize,
        event: String,
        reason: String,
    },

    #[error("{event} event has no address field {field}")]
    MissingField { event: String, field: String },
}

/// Fetching and parsing a registration receipt failed.
#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("get_receipt failed for {tx_hash}: {reason}")]
    Rpc { tx_hash: String, reason: String },

    #[error("get_receipt for {tx_hash} timed out after {timeout:?}")]
    Timeout { tx_hash: String, timeout: Duration },

    #[error("receipt for {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Crate-level error for callers that handle every failure class in one place.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("credential resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("ABI encoding error: {0}")]
    AbiEncode(#[from] AbiEncodeError),

    #[error("transaction build error: {0}")]
    Build(#[from] BuildError),

    #[error("receipt error: {0}")]
    Receipt(#[from] ReceiptError),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Receipt(ReceiptError::Parse(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl BuildError {
    /// Whether the caller may rebuild from scratch. Only transient failures
    /// qualify; nothing is ever resumed half-way.
    pub fn is_transient(&self) -> bool {
        matches!(self, BuildError::Timeout { .. } | BuildError::Rpc { .. })
    }
}
