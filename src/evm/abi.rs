//! Swap agent ABI descriptor and call encoding
//!
//! The swap agent contracts are an external, versioned interface. Rather than
//! compiling the bindings in with `sol!`, the descriptor is loaded at runtime
//! from a JSON artifact or human-readable signatures, and every encode checks
//! the arguments against it. A renamed function or a changed parameter list
//! surfaces as an [`AbiEncodeError`] instead of a silently different payload.
//!
//! Encoding is deterministic: identical arguments always give identical bytes.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::{Event, Function, JsonAbi};
use alloy::primitives::{Address, Bytes, B256, U256};
use std::fmt;

use crate::error::AbiEncodeError;

/// Fill a swap that started on chain A; executed on chain B
pub const FILL_A_TO_B_FN: &str = "fillETH2BSCSwap";
/// Fill a swap that started on chain B; executed on chain A
pub const FILL_B_TO_A_FN: &str = "fillBSC2ETHSwap";
/// Deploy the chain B counterpart of a registered chain A token
pub const CREATE_PAIR_FN: &str = "createSwapPair";
/// ERC20 transfer, used for refunds and direct payouts
pub const TRANSFER_FN: &str = "transfer";
/// Event emitted by [`CREATE_PAIR_FN`]
pub const PAIR_CREATED_EVENT: &str = "SwapPairCreated";
/// Field of [`PAIR_CREATED_EVENT`] holding the deployed token address
pub const DEPLOYED_TOKEN_FIELD: &str = "bep20Addr";

/// Swap agent deployed on chain A
const CHAIN_A_AGENT_SIGNATURES: &[&str] = &[
    "function fillBSC2ETHSwap(bytes32 bscTxHash, address erc20Addr, address toAddress, uint256 amount) returns (bool)",
    "function registerSwapPairToBSC(address erc20Addr) returns (bool)",
    "function swapETH2BSC(address erc20Addr, uint256 amount) payable returns (bool)",
    "event SwapPairRegister(address indexed sponsor, address indexed erc20Address, string name, string symbol, uint8 decimals)",
    "event SwapStarted(address indexed erc20Addr, address indexed fromAddr, uint256 amount, uint256 feeAmount)",
    "event SwapFilled(address indexed erc20Addr, bytes32 indexed bscTxHash, address indexed toAddress, uint256 amount)",
];

/// Swap agent deployed on chain B
const CHAIN_B_AGENT_SIGNATURES: &[&str] = &[
    "function fillETH2BSCSwap(bytes32 ethTxHash, address erc20Addr, address toAddress, uint256 amount) returns (bool)",
    "function createSwapPair(bytes32 ethTxHash, address erc20Addr, string name, string symbol, uint8 decimals) returns (address)",
    "function swapBSC2ETH(address bep20Addr, uint256 amount) payable returns (bool)",
    "event SwapPairCreated(bytes32 indexed ethRegisterTxHash, address indexed bep20Addr, address indexed erc20Addr, string symbol, string name, uint8 decimals)",
    "event SwapStarted(address indexed bep20Addr, address indexed erc20Addr, address indexed fromAddr, uint256 amount, uint256 feeAmount)",
    "event SwapFilled(address indexed bep20Addr, bytes32 indexed ethTxHash, address indexed toAddress, uint256 amount)",
];

const ERC20_SIGNATURES: &[&str] = &[
    "function transfer(address recipient, uint256 amount) returns (bool)",
    "function balanceOf(address account) view returns (uint256)",
    "event Transfer(address indexed from, address indexed to, uint256 value)",
    "event Approval(address indexed owner, address indexed spender, uint256 value)",
];

/// ABI-encoded call data, consumed by the transaction builder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedCall(Bytes);

impl EncodedCall {
    /// The 4-byte function selector
    pub fn selector(&self) -> [u8; 4] {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&self.0[..4]);
        selector
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Display for EncodedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A versioned contract interface
#[derive(Debug, Clone)]
pub struct BridgeAbi {
    version: String,
    abi: JsonAbi,
}

impl BridgeAbi {
    /// Load from a compiled contract's JSON ABI array
    pub fn from_json(version: impl Into<String>, json: &str) -> Result<Self, AbiEncodeError> {
        let version = version.into();
        let abi = serde_json::from_str::<JsonAbi>(json).map_err(|e| {
            AbiEncodeError::InvalidDescriptor {
                abi: version.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { version, abi })
    }

    /// Build from human-readable signatures, e.g.
    /// `"function transfer(address to, uint256 amount) returns (bool)"`
    pub fn from_signatures<'a>(
        version: impl Into<String>,
        signatures: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, AbiEncodeError> {
        let version = version.into();
        let abi = JsonAbi::parse(signatures).map_err(|e| AbiEncodeError::InvalidDescriptor {
            abi: version.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { version, abi })
    }

    /// Built-in chain A swap agent interface
    pub fn chain_a_agent() -> Result<Self, AbiEncodeError> {
        Self::from_signatures("eth-swap-agent/v1", CHAIN_A_AGENT_SIGNATURES.iter().copied())
    }

    /// Built-in chain B swap agent interface
    pub fn chain_b_agent() -> Result<Self, AbiEncodeError> {
        Self::from_signatures("bsc-swap-agent/v1", CHAIN_B_AGENT_SIGNATURES.iter().copied())
    }

    /// Built-in ERC20 interface
    pub fn erc20() -> Result<Self, AbiEncodeError> {
        Self::from_signatures("erc20", ERC20_SIGNATURES.iter().copied())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up an event by name. Overloads are not used by the swap agents;
    /// the first declaration wins.
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.abi.event(name).and_then(|events| events.first())
    }

    fn function(&self, name: &str) -> Result<&Function, AbiEncodeError> {
        self.abi
            .function(name)
            .and_then(|functions| functions.first())
            .ok_or_else(|| AbiEncodeError::UnknownFunction {
                abi: self.version.clone(),
                function: name.to_string(),
            })
    }

    /// Encode a call to `name`. Argument types and arity must match the
    /// declaration exactly; nothing is coerced.
    pub fn encode(&self, name: &str, args: &[DynSolValue]) -> Result<EncodedCall, AbiEncodeError> {
        let function = self.function(name)?;
        let data = function
            .abi_encode_input(args)
            .map_err(|e| AbiEncodeError::ArgumentMismatch {
                abi: self.version.clone(),
                function: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(EncodedCall(data.into()))
    }

    /// Decode call data produced for `name` back into its arguments
    pub fn decode_call(&self, name: &str, data: &[u8]) -> Result<Vec<DynSolValue>, AbiEncodeError> {
        let function = self.function(name)?;
        let decode_err = |reason: String| AbiEncodeError::Decode {
            abi: self.version.clone(),
            reason,
        };

        if data.len() < 4 {
            return Err(decode_err(format!(
                "call data is {} bytes, shorter than a selector",
                data.len()
            )));
        }
        if function.selector().as_slice() != &data[..4] {
            return Err(decode_err(format!(
                "selector 0x{} does not belong to {}",
                hex::encode(&data[..4]),
                name
            )));
        }

        function
            .abi_decode_input(&data[4..], true)
            .map_err(|e| decode_err(e.to_string()))
    }
}

/// Encode the chain B call that fills a deposit observed on chain A
pub fn encode_fill_a_to_b(
    abi: &BridgeAbi,
    source_tx_hash: B256,
    source_token: Address,
    recipient: Address,
    amount: U256,
) -> Result<EncodedCall, AbiEncodeError> {
    abi.encode(
        FILL_A_TO_B_FN,
        &fill_args(source_tx_hash, source_token, recipient, amount),
    )
}

/// Encode the chain A call that fills a deposit observed on chain B
pub fn encode_fill_b_to_a(
    abi: &BridgeAbi,
    source_tx_hash: B256,
    source_token: Address,
    recipient: Address,
    amount: U256,
) -> Result<EncodedCall, AbiEncodeError> {
    abi.encode(
        FILL_B_TO_A_FN,
        &fill_args(source_tx_hash, source_token, recipient, amount),
    )
}

/// Encode registration of a new bridged pair on chain B
pub fn encode_create_pair(
    abi: &BridgeAbi,
    registration_tx_hash: B256,
    source_token: Address,
    name: &str,
    symbol: &str,
    decimals: u8,
) -> Result<EncodedCall, AbiEncodeError> {
    abi.encode(
        CREATE_PAIR_FN,
        &[
            DynSolValue::FixedBytes(registration_tx_hash, 32),
            DynSolValue::Address(source_token),
            DynSolValue::String(name.to_string()),
            DynSolValue::String(symbol.to_string()),
            DynSolValue::Uint(U256::from(decimals), 8),
        ],
    )
}

/// Encode an ERC20 transfer
pub fn encode_transfer(
    abi: &BridgeAbi,
    recipient: Address,
    amount: U256,
) -> Result<EncodedCall, AbiEncodeError> {
    abi.encode(
        TRANSFER_FN,
        &[
            DynSolValue::Address(recipient),
            DynSolValue::Uint(amount, 256),
        ],
    )
}

fn fill_args(
    source_tx_hash: B256,
    source_token: Address,
    recipient: Address,
    amount: U256,
) -> [DynSolValue; 4] {
    [
        DynSolValue::FixedBytes(source_tx_hash, 32),
        DynSolValue::Address(source_token),
        DynSolValue::Address(recipient),
        DynSolValue::Uint(amount, 256),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    fn selector_of(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    #[test]
    fn test_fill_a_to_b_layout() {
        let abi = BridgeAbi::chain_b_agent().unwrap();
        let tx_hash = B256::repeat_byte(0xAB);
        let token = Address::repeat_byte(0x11);
        let recipient = Address::repeat_byte(0x22);

        let call =
            encode_fill_a_to_b(&abi, tx_hash, token, recipient, U256::from(1_000_000u64)).unwrap();
        let bytes = call.as_bytes();

        assert_eq!(
            call.selector(),
            selector_of("fillETH2BSCSwap(bytes32,address,address,uint256)")
        );
        assert_eq!(bytes.len(), 4 + 4 * 32);
        assert_eq!(&bytes[4..36], tx_hash.as_slice());
        assert_eq!(&bytes[36..48], &[0u8; 12]);
        assert_eq!(&bytes[48..68], token.as_slice());
        assert_eq!(&bytes[80..100], recipient.as_slice());
        assert_eq!(U256::from_be_slice(&bytes[100..132]), U256::from(1_000_000u64));
    }

    #[test]
    fn test_fill_encoding_is_deterministic() {
        let abi = BridgeAbi::chain_b_agent().unwrap();
        let args = (
            B256::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            Address::repeat_byte(0x03),
            U256::from(42u64),
        );

        let first = encode_fill_a_to_b(&abi, args.0, args.1, args.2, args.3).unwrap();
        let second = encode_fill_a_to_b(&abi, args.0, args.1, args.2, args.3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_b_to_a_uses_chain_a_agent() {
        let abi = BridgeAbi::chain_a_agent().unwrap();
        let call = encode_fill_b_to_a(
            &abi,
            B256::repeat_byte(0x05),
            Address::repeat_byte(0x06),
            Address::repeat_byte(0x07),
            U256::from(9u64),
        )
        .unwrap();

        assert_eq!(
            call.selector(),
            selector_of("fillBSC2ETHSwap(bytes32,address,address,uint256)")
        );

        // The chain B agent has no such function
        let wrong = BridgeAbi::chain_b_agent().unwrap();
        let err = encode_fill_b_to_a(
            &wrong,
            B256::ZERO,
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, AbiEncodeError::UnknownFunction { .. }));
    }

    #[test]
    fn test_create_pair_round_trip() {
        let abi = BridgeAbi::chain_b_agent().unwrap();
        let tx_hash = B256::repeat_byte(0x77);
        let token = Address::repeat_byte(0x11);

        let call = encode_create_pair(&abi, tx_hash, token, "Wrapped Token", "WTKN", 18).unwrap();
        let decoded = abi.decode_call(CREATE_PAIR_FN, call.as_bytes()).unwrap();

        assert_eq!(
            decoded,
            vec![
                DynSolValue::FixedBytes(tx_hash, 32),
                DynSolValue::Address(token),
                DynSolValue::String("Wrapped Token".to_string()),
                DynSolValue::String("WTKN".to_string()),
                DynSolValue::Uint(U256::from(18u8), 8),
            ]
        );
    }

    #[test]
    fn test_transfer_selector_is_standard() {
        let abi = BridgeAbi::erc20().unwrap();
        let call = encode_transfer(&abi, Address::repeat_byte(0x33), U256::from(5u64)).unwrap();

        assert_eq!(call.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(call.as_bytes().len(), 4 + 2 * 32);
    }

    #[test]
    fn test_arity_mismatch_is_rejected() {
        let abi = BridgeAbi::from_signatures(
            "broken",
            ["function fillETH2BSCSwap(bytes32 ethTxHash, address erc20Addr, address toAddress)"],
        )
        .unwrap();

        let err = encode_fill_a_to_b(
            &abi,
            B256::ZERO,
            Address::ZERO,
            Address::ZERO,
            U256::from(1u64),
        )
        .unwrap_err();
        assert!(matches!(err, AbiEncodeError::ArgumentMismatch { .. }));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let abi = BridgeAbi::from_signatures(
            "broken",
            ["function transfer(string recipient, uint256 amount) returns (bool)"],
        )
        .unwrap();

        let err = encode_transfer(&abi, Address::ZERO, U256::from(1u64)).unwrap_err();
        match err {
            AbiEncodeError::ArgumentMismatch { abi, function, .. } => {
                assert_eq!(abi, "broken");
                assert_eq!(function, "transfer");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_function_names_the_abi() {
        let abi = BridgeAbi::erc20().unwrap();
        let err = abi.encode("trasnfer", &[]).unwrap_err();
        assert_eq!(
            err,
            AbiEncodeError::UnknownFunction {
                abi: "erc20".to_string(),
                function: "trasnfer".to_string(),
            }
        );
    }

    #[test]
    fn test_from_json_artifact() {
        let json = r#"[{
            "type": "function",
            "name": "transfer",
            "stateMutability": "nonpayable",
            "inputs": [
                {"name": "recipient", "type": "address", "internalType": "address"},
                {"name": "amount", "type": "uint256", "internalType": "uint256"}
            ],
            "outputs": [{"name": "", "type": "bool", "internalType": "bool"}]
        }]"#;

        let from_json = BridgeAbi::from_json("erc20-artifact", json).unwrap();
        let builtin = BridgeAbi::erc20().unwrap();
        let recipient = Address::repeat_byte(0x44);

        assert_eq!(
            encode_transfer(&from_json, recipient, U256::from(7u64)).unwrap(),
            encode_transfer(&builtin, recipient, U256::from(7u64)).unwrap()
        );
    }

    #[test]
    fn test_invalid_descriptor() {
        assert!(matches!(
            BridgeAbi::from_json("bad", "not an abi"),
            Err(AbiEncodeError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            BridgeAbi::from_signatures("bad", ["function ("]),
            Err(AbiEncodeError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_foreign_selector() {
        let abi = BridgeAbi::chain_b_agent().unwrap();
        let transfer = encode_transfer(
            &BridgeAbi::erc20().unwrap(),
            Address::ZERO,
            U256::from(1u64),
        )
        .unwrap();

        assert!(matches!(
            abi.decode_call(CREATE_PAIR_FN, transfer.as_bytes()),
            Err(AbiEncodeError::Decode { .. })
        ));
        assert!(matches!(
            abi.decode_call(CREATE_PAIR_FN, &[0x01]),
            Err(AbiEncodeError::Decode { .. })
        ));
    }
}
