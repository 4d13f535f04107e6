//! Relay-call verification: digest, signer recovery and channel nonces.
//!
//! Digest (EIP-191 version 0, "intended validator" = this key manager):
//! `keccak256(0x19 || 0x00 || keyManager || uint256(6) || uint256(chainId) || uint256(nonce) || uint256(value) || payload)`
//!
//! A nonce is `channel << 128 | index`; each (signer, channel) pair has its own counter.

use alloc::vec::Vec;

use stylus_sdk::alloy_primitives::{keccak256, Address, B256, U256};

use crate::{constants::LSP6_VERSION, errors::KeyManagerError};

/// Recovers the signer of a 32-byte digest from a 65-byte `r || s || v` signature.
pub trait SignerRecovery {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, KeyManagerError>;
}

impl<T: SignerRecovery + ?Sized> SignerRecovery for &T {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, KeyManagerError> {
        (**self).recover(digest, signature)
    }
}

/// Digest a controller signs to authorise `payload` through the key manager at `key_manager`.
pub fn relay_call_digest(
    key_manager: Address,
    chain_id: u64,
    nonce: U256,
    value: U256,
    payload: &[u8],
) -> B256 {
    let mut buf = Vec::with_capacity(2 + 20 + 32 * 4 + payload.len());
    buf.extend_from_slice(&[0x19, 0x00]);
    buf.extend_from_slice(key_manager.as_slice());
    buf.extend_from_slice(&U256::from(LSP6_VERSION).to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&nonce.to_be_bytes::<32>());
    buf.extend_from_slice(&value.to_be_bytes::<32>());
    buf.extend_from_slice(payload);
    keccak256(&buf)
}

/// `(channel, index)` halves of a relay nonce.
pub fn split_nonce(nonce: U256) -> (u128, u128) {
    let channel: u128 = (nonce >> 128usize).to::<u128>();
    let index: u128 = (nonce & U256::from(u128::MAX)).to::<u128>();
    (channel, index)
}

pub fn compose_nonce(channel: u128, index: u128) -> U256 {
    (U256::from(channel) << 128) | U256::from(index)
}

/// Check `nonce` against the current counter of its channel.
pub fn validate_relay_nonce(
    counter: u128,
    signer: Address,
    nonce: U256,
    signature: &[u8],
) -> Result<(), KeyManagerError> {
    let (_, index) = split_nonce(nonce);
    if index != counter {
        return Err(KeyManagerError::invalid_relay_nonce(signer, nonce, signature));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_halves() {
        let nonce = compose_nonce(7, 3);
        assert_eq!(nonce, (U256::from(7u64) << 128) + U256::from(3u64));
        assert_eq!(split_nonce(nonce), (7, 3));
        assert_eq!(split_nonce(U256::from(5u64)), (0, 5));
        assert_eq!(split_nonce(U256::MAX), (u128::MAX, u128::MAX));
    }

    #[test]
    fn nonce_must_match_counter() {
        let signer = Address::repeat_byte(0x01);
        assert!(validate_relay_nonce(2, signer, compose_nonce(9, 2), &[]).is_ok());
        assert_eq!(
            validate_relay_nonce(2, signer, compose_nonce(9, 3), &[0xaa]),
            Err(KeyManagerError::invalid_relay_nonce(signer, compose_nonce(9, 3), &[0xaa]))
        );
    }

    #[test]
    fn digest_binds_every_field() {
        let km = Address::repeat_byte(0x0a);
        let base = relay_call_digest(km, 42, U256::ZERO, U256::ZERO, &[0x01]);
        assert_ne!(base, relay_call_digest(Address::repeat_byte(0x0b), 42, U256::ZERO, U256::ZERO, &[0x01]));
        assert_ne!(base, relay_call_digest(km, 43, U256::ZERO, U256::ZERO, &[0x01]));
        assert_ne!(base, relay_call_digest(km, 42, U256::from(1u64), U256::ZERO, &[0x01]));
        assert_ne!(base, relay_call_digest(km, 42, U256::ZERO, U256::from(1u64), &[0x01]));
        assert_ne!(base, relay_call_digest(km, 42, U256::ZERO, U256::ZERO, &[0x02]));
    }

    #[test]
    fn digest_layout() {
        let km = Address::repeat_byte(0x0a);
        let mut expected = alloc::vec![0x19, 0x00];
        expected.extend_from_slice(km.as_slice());
        expected.extend_from_slice(&U256::from(6u64).to_be_bytes::<32>());
        expected.extend_from_slice(&U256::from(1u64).to_be_bytes::<32>());
        expected.extend_from_slice(&U256::from(2u64).to_be_bytes::<32>());
        expected.extend_from_slice(&U256::from(3u64).to_be_bytes::<32>());
        expected.extend_from_slice(&[0xca, 0xfe]);
        assert_eq!(
            relay_call_digest(km, 1, U256::from(2u64), U256::from(3u64), &[0xca, 0xfe]),
            keccak256(&expected)
        );
    }
}
