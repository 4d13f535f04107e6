//! LSP6 ERC725Y data keys.
//!
//! Per-controller keys are `prefix (12 bytes) || controller (20 bytes)`.

use alloy_primitives::{b256, Address, B256};

/// Leading bytes shared by every `AddressPermissions:*` mapping key.
pub const ADDRESS_PERMISSIONS_PREFIX: [u8; 6] = [0x4b, 0x80, 0x74, 0x2d, 0xe2, 0xbf];

/// `AddressPermissions:Permissions:<address>`
pub const PERMISSIONS_PREFIX: [u8; 12] = [
    0x4b, 0x80, 0x74, 0x2d, 0xe2, 0xbf, 0x82, 0xac, 0xb3, 0x63, 0x00, 0x00,
];

/// `AddressPermissions:AllowedCalls:<address>`
pub const ALLOWED_CALLS_PREFIX: [u8; 12] = [
    0x4b, 0x80, 0x74, 0x2d, 0xe2, 0xbf, 0x39, 0x3a, 0x64, 0xc7, 0x00, 0x00,
];

/// `AddressPermissions:AllowedERC725YDataKeys:<address>`
pub const ALLOWED_DATA_KEYS_PREFIX: [u8; 12] = [
    0x4b, 0x80, 0x74, 0x2d, 0xe2, 0xbf, 0x86, 0x6c, 0x29, 0x11, 0x00, 0x00,
];

/// `AddressPermissions[]` (array length, `uint128`).
pub const ADDRESS_PERMISSIONS_ARRAY: B256 =
    b256!("df30dba06db6a30e65354d9a64c609861f089545ca58c6b4dbe31a5f338cb0e3");

/// `AddressPermissions[index]` = prefix (16 bytes) || uint128 index.
pub const ADDRESS_PERMISSIONS_ARRAY_PREFIX: [u8; 16] = [
    0xdf, 0x30, 0xdb, 0xa0, 0x6d, 0xb6, 0xa3, 0x0e, 0x65, 0x35, 0x4d, 0x9a, 0x64, 0xc6, 0x09, 0x86,
];

/// `LSP1UniversalReceiverDelegate`
pub const LSP1_UNIVERSAL_RECEIVER_DELEGATE: B256 =
    b256!("0cfc51aec37c55a4d0b1a65c6255c4bf2fbdf6277f3cc0730c45b828b6db8b47");

/// `LSP1UniversalReceiverDelegate:<bytes32>` mapping prefix.
pub const LSP1_UNIVERSAL_RECEIVER_DELEGATE_PREFIX: [u8; 12] = [
    0x0c, 0xfc, 0x51, 0xae, 0xc3, 0x7c, 0x55, 0xa4, 0xd0, 0xb1, 0x00, 0x00,
];

/// What kind of key a `setData` targets, for permission selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataKeyKind {
    Permissions(Address),
    AllowedCalls(Address),
    AllowedDataKeys(Address),
    /// Starts with the `AddressPermissions` prefix but is not a known LSP6 key.
    UnknownPermissionKey,
    PermissionsArrayLength,
    PermissionsArrayElement(u128),
    UniversalReceiverDelegate,
    /// Any other key; governed by SETDATA and the allowed data keys.
    Generic,
}

pub fn permissions_key(controller: Address) -> B256 {
    mapping_key(&PERMISSIONS_PREFIX, controller)
}

pub fn allowed_calls_key(controller: Address) -> B256 {
    mapping_key(&ALLOWED_CALLS_PREFIX, controller)
}

pub fn allowed_data_keys_key(controller: Address) -> B256 {
    mapping_key(&ALLOWED_DATA_KEYS_PREFIX, controller)
}

pub fn permissions_array_element_key(index: u128) -> B256 {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(&ADDRESS_PERMISSIONS_ARRAY_PREFIX);
    key[16..].copy_from_slice(&index.to_be_bytes());
    B256::new(key)
}

fn mapping_key(prefix: &[u8; 12], controller: Address) -> B256 {
    let mut key = [0u8; 32];
    key[..12].copy_from_slice(prefix);
    key[12..].copy_from_slice(controller.as_slice());
    B256::new(key)
}

/// Classify a data key by the LSP6 namespace it belongs to.
pub fn classify_data_key(key: &B256) -> DataKeyKind {
    let bytes = key.as_slice();

    if bytes.starts_with(&ADDRESS_PERMISSIONS_PREFIX) {
        let controller = Address::from_slice(&bytes[12..]);
        return match &bytes[..12] {
            p if p == PERMISSIONS_PREFIX => DataKeyKind::Permissions(controller),
            p if p == ALLOWED_CALLS_PREFIX => DataKeyKind::AllowedCalls(controller),
            p if p == ALLOWED_DATA_KEYS_PREFIX => DataKeyKind::AllowedDataKeys(controller),
            _ => DataKeyKind::UnknownPermissionKey,
        };
    }

    if *key == ADDRESS_PERMISSIONS_ARRAY {
        return DataKeyKind::PermissionsArrayLength;
    }
    if bytes.starts_with(&ADDRESS_PERMISSIONS_ARRAY_PREFIX) {
        let mut index = [0u8; 16];
        index.copy_from_slice(&bytes[16..]);
        return DataKeyKind::PermissionsArrayElement(u128::from_be_bytes(index));
    }

    if *key == LSP1_UNIVERSAL_RECEIVER_DELEGATE
        || bytes.starts_with(&LSP1_UNIVERSAL_RECEIVER_DELEGATE_PREFIX)
    {
        return DataKeyKind::UniversalReceiverDelegate;
    }

    DataKeyKind::Generic
}
