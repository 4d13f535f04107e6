//! LSP6 Key Manager for Arbitrum Stylus.
//!
//! Controllers act on an ERC725 account through this contract. Each controller's permissions,
//! Allowed Calls and Allowed ERC725Y data keys live in the account's own key/value store.
//!
//! The `host` feature adds an in-memory chain, account and key manager for off-chain
//! simulation; the deployed contract does not carry them.

#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
extern crate alloc;

pub mod account;
pub mod classifier;
pub mod constants;
#[cfg(any(test, feature = "host"))]
pub mod dispatcher;
pub mod errors;
pub mod evaluator;
pub mod gateway;
pub mod guard;
pub mod interfaces;
pub mod key_manager;
pub mod ownable2step;
pub mod registry;
pub mod relay;
pub mod utils;


#[cfg(any(test, feature = "host"))]
pub use dispatcher::{CallContext, KeyManager, KeyManagerEvent};
pub use gateway::{Gateway, NonceStore, Verified};
pub use key_manager::LSP6KeyManager;
