//! LSP6 / LSP14 constants.

/// Version mixed into every relay-call digest.
pub const LSP6_VERSION: u64 = 6;

pub const INTERFACE_ID_ERC165: [u8; 4] = [0x01, 0xff, 0xc9, 0xa7];
pub const INTERFACE_ID_ERC1271: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];
pub const INTERFACE_ID_LSP6: [u8; 4] = [0x38, 0xbb, 0x3c, 0xdb];
pub const INTERFACE_ID_LSP0: [u8; 4] = [0x24, 0x87, 0x1b, 0x3d];
pub const INTERFACE_ID_LSP1: [u8; 4] = [0x6b, 0xb5, 0x6a, 0x14];
pub const INTERFACE_ID_LSP14: [u8; 4] = [0x94, 0xbe, 0x59, 0x99];

/// ERC1271 `isValidSignature` return values.
pub const ERC1271_SUCCESS_VALUE: [u8; 4] = INTERFACE_ID_ERC1271;
pub const ERC1271_FAILURE_VALUE: [u8; 4] = [0xff; 4];

/// Blocks after `renounceOwnership()` is initiated before it can be confirmed.
pub const RENOUNCE_OWNERSHIP_CONFIRMATION_DELAY: u64 = 100;
/// Length of the confirmation window, in blocks.
pub const RENOUNCE_OWNERSHIP_CONFIRMATION_PERIOD: u64 = 100;

/// Gas cap for the `ecrecover` precompile call.
pub const ECRECOVER_GAS: u64 = 50_000;
/// Gas cap for ERC165 probes of call targets.
pub const ERC165_PROBE_GAS: u64 = 30_000;
