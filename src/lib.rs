//! Swap Relay Core: transaction construction for a two-chain token swap bridge
//!
//! This crate builds and signs the transactions a swap relayer sends, and
//! resolves the credentials it signs with:
//!
//! - **Registry** - Validated swap pair records keyed by chain A token address
//! - **Credentials** - Signing keys and admin secrets from config or a secrets manager
//! - **EVM Module** - ABI encoding, transaction building/signing, receipt parsing
//!
//! Deciding when to swap, broadcasting, and persistence are left to the caller.
//!
//! ## Concurrency
//!
//! Every operation runs on the caller's task and spawns nothing. Builds read
//! the pending nonce without reserving it, so callers must run at most one
//! build at a time per signing key.

pub mod config;
pub mod credentials;
pub mod error;
pub mod evm;
pub mod registry;

// Re-export commonly used items at the crate root
pub use config::{EvmChainConfig, KeyManagerConfig, SwapPairConfig};
pub use credentials::{CredentialResolver, NoSecretsBackend, SecretsBackend, SigningCredentials};
pub use error::{
    AbiEncodeError, BuildError, ConfigError, Error, ParseError, ReceiptError, ResolveError, Result,
};
pub use evm::{
    build_keys, encode_create_pair, encode_fill_a_to_b, encode_fill_b_to_a, encode_transfer,
    extract_deployed_pair_address, fetch_deployed_pair_address, BridgeAbi, ChainClient,
    EncodedCall, EvmRpcClient, Receipt, SignedTransaction, TransactionBuilder,
};
pub use registry::{SwapPairRecord, SwapPairRegistry};
