//! EVM Chain Support Module
//!
//! Everything that touches an EVM chain: the swap agent ABI, call encoding,
//! RPC access, transaction signing and receipt parsing.
//!
//! ## Submodules
//!
//! - `abi` - Versioned ABI descriptor and the four swap call encoders
//! - `builder` - Nonce/gas snapshot, gas estimation and legacy signing
//! - `client` - `ChainClient` seam and its alloy HTTP implementation
//! - `receipt` - Deployed pair address extraction from registration receipts

pub mod abi;
pub mod builder;
pub mod client;
pub mod receipt;

// Re-export commonly used items
pub use abi::{
    encode_create_pair, encode_fill_a_to_b, encode_fill_b_to_a, encode_transfer, BridgeAbi,
    EncodedCall,
};
pub use builder::{build_keys, SignedTransaction, TransactionBuilder};
pub use client::{ChainClient, EvmRpcClient, Receipt};
pub use receipt::{extract_deployed_pair_address, fetch_deployed_pair_address};
