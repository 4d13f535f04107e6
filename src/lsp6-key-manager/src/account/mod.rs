//! Accounts the key manager can control.
//!
//! `onchain` talks to a deployed LSP0 account through raw calls; `memory` (feature `host`) is a
//! host-side account and chain used to simulate and test the key manager end to end.

#[cfg(any(test, feature = "host"))]
pub mod memory;
pub mod onchain;

#[cfg(any(test, feature = "host"))]
pub use memory::{Contract, MemoryAccount, World};
pub use onchain::OnchainAccount;
