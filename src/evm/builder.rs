//! Signed transaction construction
//!
//! Both build operations follow the same sequence: derive the sender, snapshot
//! the pending nonce and gas price, simulate the call to get a gas limit, then
//! sign a legacy transaction. Every RPC round-trip is bounded by the builder's
//! timeout, and any failure aborts the build before a signature exists.
//!
//! ## Nonce races
//!
//! The pending nonce is a snapshot, not a reservation. Two builds for the same
//! key running at once can read the same nonce, and the chain will accept only
//! one of the resulting transactions. Callers must serialize builds per signing
//! key.

use alloy::consensus::{SignableTransaction, Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder as _;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EvmChainConfig;
use crate::error::BuildError;
use crate::evm::abi::EncodedCall;
use crate::evm::client::ChainClient;

/// Parse a hex private key, with or without `0x`, into a signer and its address
pub fn build_keys(private_key: &str) -> Result<(PrivateKeySigner, Address), BuildError> {
    let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);

    // The parse error text is generic and never contains the key itself
    let signer: PrivateKeySigner = key_hex.parse().map_err(|e| BuildError::Signing {
        reason: format!("invalid private key: {}", e),
    })?;

    let address = signer.address();
    Ok((signer, address))
}

/// A signed legacy transaction ready for broadcast
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub nonce: u64,
    pub to: Address,
    pub value: U256,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub data: Bytes,
    pub r: U256,
    pub s: U256,
    /// Legacy `v`: 27/28 without a chain id, `35 + 2 * chain_id + parity` with one
    pub v: u128,
    pub hash: B256,
    signed: Signed<TxLegacy>,
}

impl SignedTransaction {
    fn new(signed: Signed<TxLegacy>, to: Address) -> Self {
        let tx = signed.tx();
        let signature = signed.signature();
        let y_odd = signature.recid().is_y_odd();

        Self {
            nonce: tx.nonce,
            to,
            value: tx.value,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            data: tx.input.clone(),
            r: signature.r(),
            s: signature.s(),
            v: legacy_v(y_odd, tx.chain_id),
            hash: *signed.hash(),
            signed,
        }
    }

    /// Chain id folded into the signature, `None` for Homestead signatures
    pub fn chain_id(&self) -> Option<u64> {
        self.signed.tx().chain_id
    }

    /// RLP-encoded transaction for `eth_sendRawTransaction`
    pub fn raw(&self) -> Bytes {
        TxEnvelope::Legacy(self.signed.clone())
            .encoded_2718()
            .into()
    }

    /// Recover the address that signed this transaction
    pub fn recover_sender(&self) -> Result<Address, BuildError> {
        self.signed
            .recover_signer()
            .map_err(|e| BuildError::Signing {
                reason: format!("failed to recover signer: {}", e),
            })
    }
}

fn legacy_v(y_odd: bool, chain_id: Option<u64>) -> u128 {
    let parity = y_odd as u128;
    match chain_id {
        Some(id) => 35 + 2 * id as u128 + parity,
        None => 27 + parity,
    }
}

/// Builds signed transactions from live chain state
pub struct TransactionBuilder<C> {
    client: C,
    /// `Some` signs with EIP-155 replay protection
    chain_id: Option<u64>,
    timeout: Duration,
}

impl<C: ChainClient> TransactionBuilder<C> {
    /// Homestead-signing builder; `timeout` bounds each RPC round-trip
    pub fn new(client: C, timeout: Duration) -> Self {
        Self {
            client,
            chain_id: None,
            timeout,
        }
    }

    /// Sign with the chain id folded into `v`
    pub fn with_eip155(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn from_config(client: C, config: &EvmChainConfig) -> Self {
        let builder = Self::new(client, config.rpc_timeout());
        if config.eip155 {
            builder.with_eip155(config.chain_id)
        } else {
            builder
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Build a zero-value call to `contract` carrying `payload`
    pub async fn build_contract_call(
        &self,
        contract: Address,
        payload: EncodedCall,
        signer: &PrivateKeySigner,
    ) -> Result<SignedTransaction, BuildError> {
        self.build(contract, U256::ZERO, payload.into_bytes(), signer)
            .await
    }

    /// Build a native coin transfer of `value` wei to `to`
    pub async fn build_value_transfer(
        &self,
        to: Address,
        value: U256,
        signer: &PrivateKeySigner,
    ) -> Result<SignedTransaction, BuildError> {
        self.build(to, value, Bytes::new(), signer).await
    }

    async fn build(
        &self,
        to: Address,
        value: U256,
        input: Bytes,
        signer: &PrivateKeySigner,
    ) -> Result<SignedTransaction, BuildError> {
        let from = signer.address();

        let nonce = self
            .bounded("pending_nonce", self.client.pending_nonce(from))
            .await?
            .map_err(|e| BuildError::Rpc {
                operation: "pending_nonce",
                reason: format!("{:#}", e),
            })?;

        let gas_price = self
            .bounded("suggested_gas_price", self.client.suggested_gas_price())
            .await?
            .map_err(|e| BuildError::Rpc {
                operation: "suggested_gas_price",
                reason: format!("{:#}", e),
            })?;

        let call = TransactionRequest::default()
            .from(from)
            .to(to)
            .with_gas_price(gas_price)
            .value(value)
            .input(input.clone().into());

        let gas_limit = self
            .bounded("estimate_gas", self.client.estimate_gas(&call))
            .await?
            .map_err(|e| {
                warn!(from = %from, to = %to, error = %e, "Gas estimation failed");
                BuildError::GasEstimation {
                    reason: format!("{:#}", e),
                }
            })?;

        debug!(
            from = %from,
            to = %to,
            nonce = nonce,
            gas_price = gas_price,
            gas_limit = gas_limit,
            "Chain state snapshot for transaction"
        );

        let tx = TxLegacy {
            chain_id: self.chain_id,
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(to),
            value,
            input,
        };

        let signature = signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| BuildError::Signing {
                reason: e.to_string(),
            })?;
        let signed = SignedTransaction::new(tx.into_signed(signature), to);

        info!(
            tx_hash = %signed.hash,
            from = %from,
            to = %to,
            nonce = nonce,
            "Built signed transaction"
        );

        Ok(signed)
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = T>,
    ) -> Result<T, BuildError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| BuildError::Timeout {
                operation,
                timeout: self.timeout,
            })
    }
}
