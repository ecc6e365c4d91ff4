//! Swap Flow Integration Test
//!
//! Drives pair registration and swap fills end to end against an in-memory
//! chain: registry -> credentials -> call encoding -> signing -> receipt parsing.
//!
//! ```bash
//! RUST_LOG=swap_relay_core=debug cargo test --test swap_flow -- --nocapture
//! ```

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Log, B256, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use swap_relay_core::evm::abi::{CREATE_PAIR_FN, PAIR_CREATED_EVENT};
use swap_relay_core::{
    encode_create_pair, encode_fill_a_to_b, encode_transfer, fetch_deployed_pair_address,
    BridgeAbi, BuildError, ChainClient, CredentialResolver, KeyManagerConfig, NoSecretsBackend,
    Receipt, SwapPairConfig, SwapPairRegistry, TransactionBuilder,
};

const CHAIN_A_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const CHAIN_B_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory chain: per-address nonces, a fixed gas price, a set of
/// reverting selectors, and canned receipts.
struct FakeChain {
    nonces: Mutex<HashMap<Address, u64>>,
    reverting_selectors: Vec<[u8; 4]>,
    receipts: HashMap<B256, Receipt>,
}

impl FakeChain {
    fn new() -> Self {
        Self {
            nonces: Mutex::new(HashMap::new()),
            reverting_selectors: Vec::new(),
            receipts: HashMap::new(),
        }
    }

    /// Simulate broadcast + inclusion by bumping the sender nonce
    fn include(&self, sender: Address) {
        *self.nonces.lock().unwrap().entry(sender).or_insert(0) += 1;
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn pending_nonce(&self, address: Address) -> eyre::Result<u64> {
        Ok(*self.nonces.lock().unwrap().get(&address).unwrap_or(&0))
    }

    async fn suggested_gas_price(&self) -> eyre::Result<u128> {
        Ok(3_000_000_000)
    }

    async fn estimate_gas(&self, call: &TransactionRequest) -> eyre::Result<u64> {
        let input = call.input.input().cloned().unwrap_or_default();
        if input.len() >= 4 && self.reverting_selectors.iter().any(|s| s[..] == input[..4]) {
            return Err(eyre::eyre!("execution reverted"));
        }
        Ok(if input.is_empty() { 21_000 } else { 90_000 })
    }

    async fn get_receipt(&self, tx_hash: B256) -> eyre::Result<Option<Receipt>> {
        Ok(self.receipts.get(&tx_hash).cloned())
    }
}

fn pair_config() -> SwapPairConfig {
    SwapPairConfig {
        symbol: "TKN".to_string(),
        name: "Token".to_string(),
        decimals: 18,
        low_bound: "100".to_string(),
        upper_bound: "1000000".to_string(),
        source_token_address: "0x1111111111111111111111111111111111111111".to_string(),
        destination_token_address: "0x2222222222222222222222222222222222222222".to_string(),
    }
}

fn key_config() -> KeyManagerConfig {
    KeyManagerConfig::Local {
        local_hmac_key: "hmac".into(),
        local_admin_api_key: "api".into(),
        local_admin_secret_key: "secret".into(),
        local_chain_a_private_key: CHAIN_A_KEY.into(),
        local_chain_b_private_key: CHAIN_B_KEY.into(),
    }
}

#[tokio::test]
async fn test_register_pair_and_read_deployed_token() {
    init_tracing();

    let registry = SwapPairRegistry::build(&[pair_config()]).unwrap();
    let source_token = Address::repeat_byte(0x11);
    let pair = registry.get(&source_token).unwrap();
    assert_eq!(pair.low_bound, U256::from(100));
    assert_eq!(pair.upper_bound, U256::from(1_000_000));

    let credentials = CredentialResolver::new(NoSecretsBackend, Duration::from_secs(1))
        .resolve(&key_config())
        .await
        .unwrap();
    let (signer_b, address_b) = credentials.chain_b_signer().unwrap();

    let agent_abi = BridgeAbi::chain_b_agent().unwrap();
    let register_tx_hash = B256::repeat_byte(0x0F);
    let payload = encode_create_pair(
        &agent_abi,
        register_tx_hash,
        pair.source_token_address,
        &pair.name,
        &pair.symbol,
        pair.decimals,
    )
    .unwrap();

    // The payload decodes back to the pair being registered
    let args = agent_abi
        .decode_call(CREATE_PAIR_FN, payload.as_bytes())
        .unwrap();
    assert_eq!(args[1], DynSolValue::Address(source_token));
    assert_eq!(args[3], DynSolValue::String("TKN".to_string()));

    let mut chain = FakeChain::new();
    let agent = Address::repeat_byte(0xB5);
    let signed = TransactionBuilder::new(FakeChain::new(), Duration::from_secs(1))
        .build_contract_call(agent, payload, &signer_b)
        .await
        .unwrap();
    assert_eq!(signed.recover_sender().unwrap(), address_b);
    assert_eq!(signed.gas_limit, 90_000);

    // Receipt as the swap agent would emit it
    let deployed = Address::repeat_byte(0x2A);
    let event = agent_abi.event(PAIR_CREATED_EVENT).unwrap();
    let body = DynSolValue::Tuple(vec![
        DynSolValue::String(pair.symbol.clone()),
        DynSolValue::String(pair.name.clone()),
        DynSolValue::Uint(U256::from(pair.decimals), 8),
    ])
    .abi_encode_params();
    chain.receipts.insert(
        signed.hash,
        Receipt {
            transaction_hash: signed.hash,
            status: true,
            logs: vec![
                Log::new_unchecked(deployed, vec![B256::repeat_byte(0x01)], Default::default()),
                Log::new_unchecked(
                    agent,
                    vec![
                        event.selector(),
                        register_tx_hash,
                        deployed.into_word(),
                        source_token.into_word(),
                    ],
                    body.into(),
                ),
            ],
        },
    );

    let found =
        fetch_deployed_pair_address(&chain, &agent_abi, signed.hash, Duration::from_secs(1))
            .await
            .unwrap();
    assert_eq!(found, deployed);
}

#[tokio::test]
async fn test_sequential_fills_use_increasing_nonces() {
    init_tracing();

    let registry = SwapPairRegistry::build(&[pair_config()]).unwrap();
    let pair = registry.get(&Address::repeat_byte(0x11)).unwrap();
    let amount = U256::from(5_000u64);
    assert!(pair.accepts_amount(amount));

    let credentials = CredentialResolver::new(NoSecretsBackend, Duration::from_secs(1))
        .resolve(&key_config())
        .await
        .unwrap();
    let (signer_b, address_b) = credentials.chain_b_signer().unwrap();

    let abi = BridgeAbi::chain_b_agent().unwrap();
    let builder = TransactionBuilder::new(FakeChain::new(), Duration::from_secs(1));
    let agent = Address::repeat_byte(0xB5);

    let mut nonces = Vec::new();
    for deposit in [B256::repeat_byte(0xA1), B256::repeat_byte(0xA2)] {
        let payload = encode_fill_a_to_b(
            &abi,
            deposit,
            pair.source_token_address,
            Address::repeat_byte(0x77),
            amount,
        )
        .unwrap();
        let signed = builder
            .build_contract_call(agent, payload, &signer_b)
            .await
            .unwrap();
        nonces.push(signed.nonce);
        builder.client().include(address_b);
    }

    assert_eq!(nonces, vec![0, 1]);
}

#[tokio::test]
async fn test_reverting_fill_produces_no_transaction() {
    init_tracing();

    let abi = BridgeAbi::chain_b_agent().unwrap();
    let payload = encode_fill_a_to_b(
        &abi,
        B256::repeat_byte(0xA1),
        Address::repeat_byte(0x11),
        Address::repeat_byte(0x77),
        U256::from(1u64),
    )
    .unwrap();

    let mut chain = FakeChain::new();
    chain.reverting_selectors.push(payload.selector());
    let builder = TransactionBuilder::new(chain, Duration::from_secs(1));

    let (signer_a, _) = swap_relay_core::build_keys(CHAIN_A_KEY).unwrap();
    let err = builder
        .build_contract_call(Address::repeat_byte(0xB5), payload, &signer_a)
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::GasEstimation { .. }));
}

#[tokio::test]
async fn test_refund_transfer_and_native_payout() {
    init_tracing();

    let credentials = CredentialResolver::new(NoSecretsBackend, Duration::from_secs(1))
        .resolve(&key_config())
        .await
        .unwrap();
    let (signer_a, address_a) = credentials.chain_a_signer().unwrap();
    let builder = TransactionBuilder::new(FakeChain::new(), Duration::from_secs(1)).with_eip155(1);

    let refund = encode_transfer(
        &BridgeAbi::erc20().unwrap(),
        Address::repeat_byte(0x77),
        U256::from(250u64),
    )
    .unwrap();
    let token_tx = builder
        .build_contract_call(Address::repeat_byte(0x11), refund, &signer_a)
        .await
        .unwrap();
    let native_tx = builder
        .build_value_transfer(
            Address::repeat_byte(0x77),
            U256::from(10u64).pow(U256::from(18)),
            &signer_a,
        )
        .await
        .unwrap();

    assert_eq!(token_tx.recover_sender().unwrap(), address_a);
    assert_eq!(native_tx.recover_sender().unwrap(), address_a);
    assert_eq!(native_tx.gas_limit, 21_000);
    assert_eq!(token_tx.chain_id(), Some(1));
    assert!(!native_tx.raw().is_empty());
}
