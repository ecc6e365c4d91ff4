//! Chain RPC access
//!
//! [`ChainClient`] is the seam between transaction construction and the
//! network. [`EvmRpcClient`] implements it over an alloy HTTP provider; tests
//! substitute in-memory clients.

use alloy::primitives::{Address, Log, B256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tracing::info;

/// The parts of a transaction receipt this crate reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    /// `true` when execution succeeded
    pub status: bool,
    /// Emitted logs, in emission order
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status(),
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }
    }
}

/// Chain state queries needed to build and follow up transactions
///
/// Implementations are shared, read-mostly collaborators; any locking beyond
/// what the transport provides is not required.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Transaction count of `address` including pending transactions
    async fn pending_nonce(&self, address: Address) -> Result<u64>;

    /// Suggested legacy gas price in wei
    async fn suggested_gas_price(&self) -> Result<u128>;

    /// Simulate `call` and return the gas it needs. Errors when the call reverts.
    async fn estimate_gas(&self, call: &TransactionRequest) -> Result<u64>;

    /// Receipt for `tx_hash`, `None` while the transaction is not mined
    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>>;
}

#[async_trait]
impl<C: ChainClient + ?Sized> ChainClient for std::sync::Arc<C> {
    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        (**self).pending_nonce(address).await
    }

    async fn suggested_gas_price(&self) -> Result<u128> {
        (**self).suggested_gas_price().await
    }

    async fn estimate_gas(&self, call: &TransactionRequest) -> Result<u64> {
        (**self).estimate_gas(call).await
    }

    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>> {
        (**self).get_receipt(tx_hash).await
    }
}

/// JSON-RPC client over HTTP
pub struct EvmRpcClient {
    provider: RootProvider<Http<Client>>,
    chain_id: u64,
}

impl EvmRpcClient {
    pub fn new(rpc_url: &str, chain_id: u64) -> Result<Self> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| eyre!("Invalid RPC URL: {}", e))?,
        );

        info!(rpc_url = %rpc_url, chain_id = chain_id, "Created EVM RPC client");

        Ok(Self { provider, chain_id })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl ChainClient for EvmRpcClient {
    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .wrap_err("Failed to get pending nonce")
    }

    async fn suggested_gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .wrap_err("Failed to get gas price")
    }

    async fn estimate_gas(&self, call: &TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(call)
            .await
            .wrap_err("Failed to estimate gas")
    }

    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<Receipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .wrap_err("Failed to get transaction receipt")?;
        Ok(receipt.as_ref().map(Receipt::from))
    }
}
