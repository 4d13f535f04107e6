//! Shared LSP6 types used on-chain (Stylus key manager) and off-chain (encoder, relayers).

#![no_std]

extern crate alloc;

pub mod account;
pub mod allowed_calls;
pub mod allowed_keys;
pub mod compact;
pub mod keys;
pub mod permissions;

pub use account::{AccountError, Erc725Account};
pub use allowed_calls::{AllowedCall, AllowedCallsError};
pub use allowed_keys::AllowedKeysError;
pub use compact::CompactBytesArrayError;
pub use keys::{classify_data_key, DataKeyKind};
pub use permissions::Permissions;
