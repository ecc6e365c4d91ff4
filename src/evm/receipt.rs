//! Pair registration receipt parsing
//!
//! A `createSwapPair` transaction emits exactly two logs: an intermediate event
//! from the token deployment, then `SwapPairCreated` from the swap agent. The
//! deployed token address is read from the second log.
//!
//! The position of the pair-creation log is an assumption about the contract's
//! emission order, not something the receipt guarantees. The topic of log 1 is
//! checked against the event selector so a reordering fails loudly rather than
//! decoding the wrong event.

use alloy::dyn_abi::{DynSolValue, EventExt};
use alloy::primitives::{Address, Log, B256};
use std::time::Duration;
use tracing::debug;

use crate::error::{ParseError, ReceiptError};
use crate::evm::abi::{BridgeAbi, DEPLOYED_TOKEN_FIELD, PAIR_CREATED_EVENT};
use crate::evm::client::{ChainClient, Receipt};

/// Number of logs a registration transaction emits
pub const REGISTRATION_LOG_COUNT: usize = 2;
/// Position of the pair-creation log within the receipt
pub const PAIR_CREATED_LOG_INDEX: usize = 1;

/// Read the deployed pair token address from a registration receipt
pub fn extract_deployed_pair_address(
    abi: &BridgeAbi,
    receipt: &Receipt,
) -> Result<Address, ParseError> {
    let address = extract_from_logs(abi, &receipt.logs)?;
    debug!(
        tx_hash = %receipt.transaction_hash,
        deployed_token = %address,
        "Deployed pair token from registration receipt"
    );
    Ok(address)
}

fn extract_from_logs(abi: &BridgeAbi, logs: &[Log]) -> Result<Address, ParseError> {
    if logs.len() != REGISTRATION_LOG_COUNT {
        return Err(ParseError::UnexpectedLogCount(logs.len()));
    }

    let index = PAIR_CREATED_LOG_INDEX;
    let decode_err = |reason: String| ParseError::Decode {
        index,
        event: PAIR_CREATED_EVENT.to_string(),
        reason,
    };

    let event = abi
        .event(PAIR_CREATED_EVENT)
        .ok_or_else(|| decode_err(format!("ABI {} does not declare the event", abi.version())))?;

    let log = &logs[index];
    match log.data.topics().first() {
        Some(topic) if *topic == event.selector() => {}
        Some(topic) => return Err(decode_err(format!("unexpected topic {}", topic))),
        None => return Err(decode_err("log has no topics".to_string())),
    }

    let decoded = event
        .decode_log(&log.data, true)
        .map_err(|e| decode_err(e.to_string()))?;

    // Walk the inputs in declaration order, splitting them between the indexed
    // topics and the data body, to find the named field.
    let (mut indexed, mut body) = (decoded.indexed.iter(), decoded.body.iter());
    for param in &event.inputs {
        let value = if param.indexed {
            indexed.next()
        } else {
            body.next()
        };

        if param.name == DEPLOYED_TOKEN_FIELD {
            return match value {
                Some(DynSolValue::Address(address)) => Ok(*address),
                _ => Err(ParseError::MissingField {
                    event: PAIR_CREATED_EVENT.to_string(),
                    field: DEPLOYED_TOKEN_FIELD.to_string(),
                }),
            };
        }
    }

    Err(ParseError::MissingField {
        event: PAIR_CREATED_EVENT.to_string(),
        field: DEPLOYED_TOKEN_FIELD.to_string(),
    })
}

/// Fetch a registration receipt and read the deployed pair token address
pub async fn fetch_deployed_pair_address<C: ChainClient>(
    client: &C,
    abi: &BridgeAbi,
    tx_hash: B256,
    timeout: Duration,
) -> Result<Address, ReceiptError> {
    let receipt = tokio::time::timeout(timeout, client.get_receipt(tx_hash))
        .await
        .map_err(|_| ReceiptError::Timeout {
            tx_hash: tx_hash.to_string(),
            timeout,
        })?
        .map_err(|e| ReceiptError::Rpc {
            tx_hash: tx_hash.to_string(),
            reason: format!("{:#}", e),
        })?
        .ok_or_else(|| ReceiptError::NotFound(tx_hash.to_string()))?;

    Ok(extract_deployed_pair_address(abi, &receipt)?)
}
