//! Allowed Calls entries.
//!
//! Each entry is 32 bytes:
//! `bytes4 callTypes || address target || bytes4 interfaceId || bytes4 selector`.

use alloc::vec::Vec;
use alloy_primitives::{address, Address};

use crate::compact::{self, CompactBytesArrayError};

pub const ENTRY_LEN: usize = 32;

pub const CALL_TYPE_VALUE: u32 = 0x01;
pub const CALL_TYPE_CALL: u32 = 0x02;
pub const CALL_TYPE_STATICCALL: u32 = 0x04;
pub const CALL_TYPE_DELEGATECALL: u32 = 0x08;

pub const ANY_ADDRESS: Address = address!("ffffffffffffffffffffffffffffffffffffffff");
pub const ANY_INTERFACE: [u8; 4] = [0xff; 4];
pub const ANY_SELECTOR: [u8; 4] = [0xff; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedCallsError {
    Compact(CompactBytesArrayError),
    /// Element `index` is not exactly 32 bytes.
    InvalidEntryLength { index: usize, len: usize },
    /// Element `index` wildcards target, interface and selector at once.
    AllWildcards { index: usize },
}

impl From<CompactBytesArrayError> for AllowedCallsError {
    fn from(err: CompactBytesArrayError) -> Self {
        AllowedCallsError::Compact(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedCall {
    pub call_types: u32,
    pub target: Address,
    pub interface_id: [u8; 4],
    pub selector: [u8; 4],
}

impl AllowedCall {
    pub fn new(call_types: u32, target: Address, interface_id: [u8; 4], selector: [u8; 4]) -> Self {
        Self { call_types, target, interface_id, selector }
    }

    pub fn from_bytes(entry: &[u8; ENTRY_LEN]) -> Self {
        let mut call_types = [0u8; 4];
        call_types.copy_from_slice(&entry[0..4]);
        let mut interface_id = [0u8; 4];
        interface_id.copy_from_slice(&entry[24..28]);
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&entry[28..32]);
        Self {
            call_types: u32::from_be_bytes(call_types),
            target: Address::from_slice(&entry[4..24]),
            interface_id,
            selector,
        }
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_LEN] {
        let mut out = [0u8; ENTRY_LEN];
        out[0..4].copy_from_slice(&self.call_types.to_be_bytes());
        out[4..24].copy_from_slice(self.target.as_slice());
        out[24..28].copy_from_slice(&self.interface_id);
        out[28..32].copy_from_slice(&self.selector);
        out
    }

    pub fn is_all_wildcards(&self) -> bool {
        self.target == ANY_ADDRESS
            && self.interface_id == ANY_INTERFACE
            && self.selector == ANY_SELECTOR
    }

    /// True if the entry grants every call-type bit in `required`.
    pub fn permits_call_types(&self, required: u32) -> bool {
        self.call_types & required == required
    }

    pub fn matches_target(&self, target: Address) -> bool {
        self.target == ANY_ADDRESS || self.target == target
    }

    pub fn matches_selector(&self, selector: [u8; 4]) -> bool {
        self.selector == ANY_SELECTOR || self.selector == selector
    }

    /// Interface the target must advertise via ERC165, if any.
    pub fn required_interface(&self) -> Option<[u8; 4]> {
        if self.interface_id == ANY_INTERFACE {
            None
        } else {
            Some(self.interface_id)
        }
    }
}

/// Decode and validate a stored Allowed Calls value. An empty value is an empty list.
pub fn decode(bytes: &[u8]) -> Result<Vec<AllowedCall>, AllowedCallsError> {
    let mut calls = Vec::new();
    for (index, element) in compact::decode(bytes)?.into_iter().enumerate() {
        let entry: &[u8; ENTRY_LEN] = element
            .try_into()
            .map_err(|_| AllowedCallsError::InvalidEntryLength { index, len: element.len() })?;
        let call = AllowedCall::from_bytes(entry);
        if call.is_all_wildcards() {
            return Err(AllowedCallsError::AllWildcards { index });
        }
        calls.push(call);
    }
    Ok(calls)
}

pub fn encode(calls: &[AllowedCall]) -> Vec<u8> {
    let mut out = Vec::with_capacity(calls.len() * (ENTRY_LEN + 2));
    for call in calls {
        out.extend_from_slice(&(ENTRY_LEN as u16).to_be_bytes());
        out.extend_from_slice(&call.to_bytes());
    }
    out
}

/// Write-time check for a new Allowed Calls value.
pub fn validate(bytes: &[u8]) -> Result<(), AllowedCallsError> {
    decode(bytes).map(|_| ())
}
