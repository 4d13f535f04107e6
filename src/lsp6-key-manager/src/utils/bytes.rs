//! Minimal ABI word helpers.
//!
//! Used for the account's `bytes` return values and for the reference account's replies.

use alloc::vec::Vec;

use stylus_sdk::alloy_primitives::{Address, U256};

/// ABI-encode a single dynamic `bytes` value (`offset || length || data || padding`).
pub fn encode_abi_bytes(data: &[u8]) -> Vec<u8> {
    let padded = data.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(64 + padded);
    out.extend_from_slice(&U256::from(32u64).to_be_bytes::<32>());
    out.extend_from_slice(&U256::from(data.len()).to_be_bytes::<32>());
    out.extend_from_slice(data);
    out.resize(64 + padded, 0);
    out
}

/// Decode a return value consisting of a single dynamic `bytes`.
pub fn decode_abi_bytes(out: &[u8]) -> Result<Vec<u8>, ()> {
    let mut i = 0usize;
    let offset = read_usize_word(out, &mut i)?;
    let mut i = offset;
    let len = read_usize_word(out, &mut i)?;
    read_vec(out, &mut i, len)
}

/// Map a calldata decoding failure to an empty revert.
pub fn undecodable(_: alloy_sol_types::Error) -> Vec<u8> {
    Vec::new()
}

pub fn encode_address_word(address: Address) -> Vec<u8> {
    let mut out = alloc::vec![0u8; 32];
    out[12..32].copy_from_slice(address.as_slice());
    out
}

pub fn encode_bool_word(value: bool) -> Vec<u8> {
    let mut out = alloc::vec![0u8; 32];
    out[31] = value as u8;
    out
}

/// Strict ABI `bool`: only 0 and 1 are accepted.
pub fn decode_bool_word(out: &[u8]) -> Result<bool, ()> {
    if out.len() < 32 || out[..31].iter().any(|b| *b != 0) {
        return Err(());
    }
    match out[31] {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(()),
    }
}

pub fn read_vec(bytes: &[u8], i: &mut usize, len: usize) -> Result<Vec<u8>, ()> {
    let end = i.checked_add(len).ok_or(())?;
    if bytes.len() < end {
        return Err(());
    }
    let out = bytes[*i..end].to_vec();
    *i = end;
    Ok(out)
}

fn read_usize_word(bytes: &[u8], i: &mut usize) -> Result<usize, ()> {
    let end = i.checked_add(32).ok_or(())?;
    if bytes.len() < end {
        return Err(());
    }
    let word = U256::from_be_slice(&bytes[*i..end]);
    *i = end;
    usize::try_from(word).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_word_layout() {
        let encoded = encode_abi_bytes(&[0xaa; 33]);
        assert_eq!(encoded.len(), 32 + 32 + 64);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63], 33);
        assert_eq!(decode_abi_bytes(&encoded).unwrap(), alloc::vec![0xaa; 33]);
        assert_eq!(decode_abi_bytes(&encode_abi_bytes(&[])).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_truncated_bytes() {
        let mut encoded = encode_abi_bytes(&[0x01; 40]);
        encoded.truncate(70);
        assert!(decode_abi_bytes(&encoded).is_err());
        assert!(decode_abi_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn bool_words() {
        assert_eq!(decode_bool_word(&encode_bool_word(true)), Ok(true));
        assert_eq!(decode_bool_word(&encode_bool_word(false)), Ok(false));
        let mut dirty = encode_bool_word(true);
        dirty[0] = 1;
        assert!(decode_bool_word(&dirty).is_err());
    }
}
