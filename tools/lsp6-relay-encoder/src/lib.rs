//! Off-chain side of the LSP6 Key Manager: permission and allow-list encoders, account payload
//! builders, and relay-call digests and signatures.

pub mod encoder;
pub mod types;


pub use lsp6_key_manager_types::{allowed_calls, keys, permissions, AllowedCall};
