//! CompactBytesArray: `uint16 length || bytes` repeated, big-endian.

use alloc::vec::Vec;

/// Errors while decoding a CompactBytesArray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactBytesArrayError {
    /// A length prefix or element runs past the end of the input.
    Truncated,
    /// An element is longer than `u16::MAX` and cannot be encoded.
    ElementTooLong(usize),
}

/// Split a CompactBytesArray into its elements (borrowed from `bytes`).
pub fn decode(bytes: &[u8]) -> Result<Vec<&[u8]>, CompactBytesArrayError> {
    let mut elements = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let len = read_u16(bytes, &mut i)? as usize;
        if bytes.len() < i + len {
            return Err(CompactBytesArrayError::Truncated);
        }
        elements.push(&bytes[i..i + len]);
        i += len;
    }

    Ok(elements)
}

pub fn encode<T: AsRef<[u8]>>(elements: &[T]) -> Result<Vec<u8>, CompactBytesArrayError> {
    let mut out = Vec::new();
    for element in elements {
        let element = element.as_ref();
        let len = u16::try_from(element.len())
            .map_err(|_| CompactBytesArrayError::ElementTooLong(element.len()))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(element);
    }
    Ok(out)
}

fn read_u16(bytes: &[u8], i: &mut usize) -> Result<u16, CompactBytesArrayError> {
    if bytes.len() < *i + 2 {
        return Err(CompactBytesArrayError::Truncated);
    }
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&bytes[*i..*i + 2]);
    *i += 2;
    Ok(u16::from_be_bytes(buf))
}
