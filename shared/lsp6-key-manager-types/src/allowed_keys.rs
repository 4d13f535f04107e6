//! Allowed ERC725Y data keys: a CompactBytesArray of 1..=32-byte key prefixes.

use alloc::vec::Vec;
use alloy_primitives::B256;

use crate::compact::{self, CompactBytesArrayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedKeysError {
    Compact(CompactBytesArrayError),
    /// Element `index` is empty or longer than 32 bytes.
    InvalidEntryLength { index: usize, len: usize },
}

impl From<CompactBytesArrayError> for AllowedKeysError {
    fn from(err: CompactBytesArrayError) -> Self {
        AllowedKeysError::Compact(err)
    }
}

pub fn decode(bytes: &[u8]) -> Result<Vec<&[u8]>, AllowedKeysError> {
    let entries = compact::decode(bytes)?;
    for (index, entry) in entries.iter().enumerate() {
        if entry.is_empty() || entry.len() > 32 {
            return Err(AllowedKeysError::InvalidEntryLength { index, len: entry.len() });
        }
    }
    Ok(entries)
}

pub fn encode<T: AsRef<[u8]>>(prefixes: &[T]) -> Result<Vec<u8>, AllowedKeysError> {
    for (index, prefix) in prefixes.iter().enumerate() {
        let len = prefix.as_ref().len();
        if len == 0 || len > 32 {
            return Err(AllowedKeysError::InvalidEntryLength { index, len });
        }
    }
    Ok(compact::encode(prefixes)?)
}

pub fn validate(bytes: &[u8]) -> Result<(), AllowedKeysError> {
    decode(bytes).map(|_| ())
}

/// `key` is allowed if it starts with any entry. A 32-byte entry is an exact match.
pub fn is_allowed(entries: &[&[u8]], key: &B256) -> bool {
    entries.iter().any(|prefix| key.as_slice().starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_exact_matches() {
        let exact = [0x11u8; 32];
        let encoded = encode(&[&[0xaa, 0xaa][..], &exact[..]]).unwrap();
        let entries = decode(&encoded).unwrap();

        let mut prefixed = [0u8; 32];
        prefixed[0] = 0xaa;
        prefixed[1] = 0xaa;
        prefixed[31] = 0x01;
        assert!(is_allowed(&entries, &B256::new(prefixed)));
        assert!(is_allowed(&entries, &B256::new(exact)));

        let mut near = exact;
        near[31] = 0x12;
        assert!(!is_allowed(&entries, &B256::new(near)));
        assert!(!is_allowed(&entries, &B256::repeat_byte(0xbb)));
    }

    #[test]
    fn empty_list_allows_nothing() {
        let entries = decode(&[]).unwrap();
        assert!(!is_allowed(&entries, &B256::ZERO));
    }

    #[test]
    fn rejects_bad_entry_lengths() {
        assert_eq!(
            validate(&[0x00, 0x00]),
            Err(AllowedKeysError::InvalidEntryLength { index: 0, len: 0 })
        );
        let mut long = alloc::vec![0x00, 33];
        long.extend_from_slice(&[0u8; 33]);
        assert_eq!(
            validate(&long),
            Err(AllowedKeysError::InvalidEntryLength { index: 0, len: 33 })
        );
        assert_eq!(validate(&[0x00, 0x05, 0x01]), Err(AllowedKeysError::Compact(CompactBytesArrayError::Truncated)));
    }
}
