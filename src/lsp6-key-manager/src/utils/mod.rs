//! Shared utilities for the key manager.
//!
//! These helpers are small and deterministic, as they run inside Stylus / WASM.

pub mod bytes;
pub mod crypto;
