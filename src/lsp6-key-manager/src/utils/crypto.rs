//! Signer recovery back-ends for relay calls and ERC1271.
//!
//! On-chain we use the EVM `ecrecover` precompile at `0x01`; on the host (feature `host`)
//! we recover with k256 directly. Both apply the same malleability rules.

#[cfg(any(test, feature = "host"))]
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use stylus_sdk::{
    alloy_primitives::{keccak256, Address, B256, U256},
    call::RawCall,
};

use crate::{constants::ECRECOVER_GAS, errors::KeyManagerError, relay::SignerRecovery};

/// secp256k1 group order / 2; signatures with a larger `s` are rejected.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Split `r || s || v`, normalising `v` to {27, 28} and rejecting high-`s` signatures.
fn split_signature(signature: &[u8]) -> Result<(&[u8], &[u8], u8), KeyManagerError> {
    if signature.len() != 65 {
        return Err(KeyManagerError::invalid_relay_signature());
    }
    let r = &signature[0..32];
    let s = &signature[32..64];
    let v = match signature[64] {
        v @ (27 | 28) => v,
        v @ (0 | 1) => v + 27,
        _ => return Err(KeyManagerError::invalid_relay_signature()),
    };
    if U256::from_be_slice(s) > U256::from_be_bytes(SECP256K1_HALF_ORDER) {
        return Err(KeyManagerError::invalid_relay_signature());
    }
    Ok((r, s, v))
}

/// Recovery through the `ecrecover` precompile.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrecompileRecovery;

impl SignerRecovery for PrecompileRecovery {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, KeyManagerError> {
        let (r, s, v) = split_signature(signature)?;

        let mut precompile = [0u8; 20];
        precompile[19] = 1;
        let to = Address::from_slice(&precompile);

        let mut input = [0u8; 128];
        input[0..32].copy_from_slice(digest.as_slice());
        // v as 32-byte big-endian word.
        input[63] = v;
        input[64..96].copy_from_slice(r);
        input[96..128].copy_from_slice(s);

        let out = unsafe { RawCall::new_static().gas(ECRECOVER_GAS).call(to, &input) }
            .map_err(|_| KeyManagerError::invalid_relay_signature())?;
        // precompile returns nothing on failure, else a 32-byte word with the address in the low 20 bytes.
        if out.len() < 32 {
            return Err(KeyManagerError::invalid_relay_signature());
        }
        let recovered = Address::from_slice(&out[12..32]);
        if recovered == Address::ZERO {
            return Err(KeyManagerError::invalid_relay_signature());
        }
        Ok(recovered)
    }
}

/// Pure-Rust recovery with k256.
#[cfg(any(test, feature = "host"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Recovery;

#[cfg(any(test, feature = "host"))]
impl SignerRecovery for Secp256k1Recovery {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, KeyManagerError> {
        let (_, _, v) = split_signature(signature)?;
        let sig = Signature::from_slice(&signature[..64])
            .map_err(|_| KeyManagerError::invalid_relay_signature())?;
        let recovery_id =
            RecoveryId::from_byte(v - 27).ok_or_else(KeyManagerError::invalid_relay_signature)?;
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
            .map_err(|_| KeyManagerError::invalid_relay_signature())?;
        Ok(address_of(&key))
    }
}

/// Ethereum address of a public key: last 20 bytes of keccak256(uncompressed point without prefix).
#[cfg(any(test, feature = "host"))]
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
