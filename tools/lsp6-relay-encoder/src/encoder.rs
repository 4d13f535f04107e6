use alloy_primitives::{Address, FixedBytes, U256};
use k256::ecdsa::SigningKey;
use lsp6_key_manager_types::{
    allowed_calls::{self, AllowedCall},
    allowed_keys::{self, AllowedKeysError},
    permissions::{combine, from_name},
};
use sha3::{Digest, Keccak256};

use crate::types::RelayCall;

/// LSP6 version byte mixed into every relay digest.
const LSP6_VERSION: u64 = 6;

pub fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256_bytes(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Relay digest (must match the key manager's on-chain digest).
///
/// `keccak256(0x19 || 0x00 || keyManager || uint256(6) || uint256(chainId) || uint256(nonce) || uint256(value) || payload)`
pub fn relay_call_digest(call: &RelayCall) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(2 + 20 + 32 * 4 + call.payload.len());
    buf.extend_from_slice(b"\x19\x00");
    buf.extend_from_slice(call.key_manager.as_slice());
    buf.extend_from_slice(&U256::from(LSP6_VERSION).to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(call.chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&call.nonce.to_be_bytes::<32>());
    buf.extend_from_slice(&call.value.to_be_bytes::<32>());
    buf.extend_from_slice(&call.payload);
    keccak256_bytes(&buf)
}

/// Recoverable signature `r || s || v` over a 32-byte digest, with `v` in {27, 28}.
pub fn sign_digest(digest: FixedBytes<32>, signing_key: &SigningKey) -> Result<Vec<u8>, k256::ecdsa::Error> {
    let (signature, recovery_id) = signing_key.sign_prehash_recoverable(digest.as_slice())?;
    // k256 normalises s to the lower half, which the key manager requires.
    let mut sig_bytes = Vec::with_capacity(65);
    sig_bytes.extend_from_slice(&signature.to_bytes());
    sig_bytes.push(27 + recovery_id.to_byte());
    Ok(sig_bytes)
}

/// Sign the relay digest and write the 65-byte signature into `call.signature`.
pub fn sign_relay_call(call: &mut RelayCall, signing_key: &SigningKey) -> Result<(), k256::ecdsa::Error> {
    call.signature = sign_digest(relay_call_digest(call), signing_key)?;
    Ok(())
}

/// Ethereum address of a signing key.
pub fn signer_address(signing_key: &SigningKey) -> Address {
    let point = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256_bytes(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// 32-byte permission value from permission names (case-insensitive). Returns the first
/// unknown name on failure.
pub fn encode_permissions<S: AsRef<str>>(names: &[S]) -> Result<[u8; 32], String> {
    let mut bits = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        bits.push(from_name(name).ok_or_else(|| name.to_string())?);
    }
    Ok(combine(&bits).to_be_bytes::<32>())
}

pub fn encode_allowed_calls(calls: &[AllowedCall]) -> Vec<u8> {
    allowed_calls::encode(calls)
}

pub fn encode_allowed_data_keys<T: AsRef<[u8]>>(prefixes: &[T]) -> Result<Vec<u8>, AllowedKeysError> {
    allowed_keys::encode(prefixes)
}

fn push_word(buf: &mut Vec<u8>, word: U256) {
    buf.extend_from_slice(&word.to_be_bytes::<32>());
}

fn push_address(buf: &mut Vec<u8>, address: Address) {
    buf.extend_from_slice(&[0u8; 12]);
    buf.extend_from_slice(address.as_slice());
}

/// `length || data || zero padding to 32 bytes`.
fn push_bytes_tail(buf: &mut Vec<u8>, data: &[u8]) {
    push_word(buf, U256::from(data.len()));
    buf.extend_from_slice(data);
    let padding = (32 - data.len() % 32) % 32;
    buf.extend(core::iter::repeat(0u8).take(padding));
}

fn padded_len(data: &[u8]) -> usize {
    32 + data.len().div_ceil(32) * 32
}

/// `setData(bytes32,bytes)`
pub fn set_data_payload(key: FixedBytes<32>, value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 64 + padded_len(value));
    buf.extend_from_slice(&selector("setData(bytes32,bytes)"));
    buf.extend_from_slice(key.as_slice());
    push_word(&mut buf, U256::from(64u64));
    push_bytes_tail(&mut buf, value);
    buf
}

/// `setDataBatch(bytes32[],bytes[])`
pub fn set_data_batch_payload(keys: &[FixedBytes<32>], values: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&selector("setDataBatch(bytes32[],bytes[])"));
    push_word(&mut buf, U256::from(64u64));
    push_word(&mut buf, U256::from(64 + 32 + 32 * keys.len()));

    push_word(&mut buf, U256::from(keys.len()));
    for key in keys {
        buf.extend_from_slice(key.as_slice());
    }

    push_word(&mut buf, U256::from(values.len()));
    let mut offset = 32 * values.len();
    for value in values {
        push_word(&mut buf, U256::from(offset));
        offset += padded_len(value);
    }
    for value in values {
        push_bytes_tail(&mut buf, value);
    }
    buf
}

/// `execute(uint256,address,uint256,bytes)`; `operation` is the ERC725X operation type
/// (0 CALL, 1 CREATE, 2 CREATE2, 3 STATICCALL, 4 DELEGATECALL).
pub fn execute_payload(operation: u8, target: Address, value: U256, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 128 + padded_len(data));
    buf.extend_from_slice(&selector("execute(uint256,address,uint256,bytes)"));
    push_word(&mut buf, U256::from(operation));
    push_address(&mut buf, target);
    push_word(&mut buf, value);
    push_word(&mut buf, U256::from(128u64));
    push_bytes_tail(&mut buf, data);
    buf
}

/// `transferOwnership(address)`
pub fn transfer_ownership_payload(new_owner: Address) -> Vec<u8> {
    let mut buf = Vec::with_capacity(36);
    buf.extend_from_slice(&selector("transferOwnership(address)"));
    push_address(&mut buf, new_owner);
    buf
}

/// `acceptOwnership()`
pub fn accept_ownership_payload() -> Vec<u8> {
    selector("acceptOwnership()").to_vec()
}

/// `renounceOwnership()`
pub fn renounce_ownership_payload() -> Vec<u8> {
    selector("renounceOwnership()").to_vec()
}
