//! The verification sequence behind `execute` and `executeRelayCall`.
//!
//! Both the Stylus entrypoint and the host key manager run payloads through [`Gateway`]; they
//! differ only in where the reentrancy flag and the relay counters live and in how the
//! resulting `VerifiedCall` is published.

use alloc::{collections::BTreeMap, vec::Vec};
use core::cell::RefCell;

use lsp6_key_manager_types::{permissions::SIGN, Erc725Account};
use stylus_sdk::{
    alloy_primitives::{keccak256, Address, B256, U256},
    storage::{StorageMap, StorageU256},
};

use crate::{
    classifier::payload_selector,
    constants::{ERC1271_FAILURE_VALUE, ERC1271_SUCCESS_VALUE},
    errors::{ExecutionError, KeyManagerError},
    evaluator::authorize,
    guard::{ReentrancyGuard, ReentrancyLock},
    registry::PermissionRegistry,
    relay::{relay_call_digest, split_nonce, validate_relay_nonce, SignerRecovery},
    utils::bytes::decode_abi_bytes,
};

/// Per-signer, per-channel relay counters.
pub trait NonceStore {
    fn counter(&self, signer: Address, channel: u128) -> u128;
    fn set_counter(&mut self, signer: Address, channel: u128, counter: u128);
}

impl NonceStore for &RefCell<BTreeMap<(Address, u128), u128>> {
    fn counter(&self, signer: Address, channel: u128) -> u128 {
        self.borrow().get(&(signer, channel)).copied().unwrap_or(0)
    }

    fn set_counter(&mut self, signer: Address, channel: u128, counter: u128) {
        self.borrow_mut().insert((signer, channel), counter);
    }
}

impl NonceStore for &mut StorageMap<B256, StorageU256> {
    fn counter(&self, signer: Address, channel: u128) -> u128 {
        self.get(nonce_slot(signer, channel)).saturating_to::<u128>()
    }

    fn set_counter(&mut self, signer: Address, channel: u128, counter: u128) {
        self.insert(nonce_slot(signer, channel), U256::from(counter));
    }
}

/// Storage slot key of a relay counter: `keccak256(signer || channel)`.
pub fn nonce_slot(signer: Address, channel: u128) -> B256 {
    let mut buf = [0u8; 36];
    buf[..20].copy_from_slice(signer.as_slice());
    buf[20..].copy_from_slice(&channel.to_be_bytes());
    keccak256(buf)
}

/// A payload that passed verification and was executed by the account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
    pub signer: Address,
    pub value: U256,
    pub selector: [u8; 4],
    /// The account's return data, with the `bytes` wrapper of `execute` removed.
    pub output: Vec<u8>,
}

pub struct Gateway<'a, A: Erc725Account, R: SignerRecovery> {
    key_manager: Address,
    chain_id: u64,
    account: &'a A,
    recovery: &'a R,
}

impl<'a, A: Erc725Account, R: SignerRecovery> Gateway<'a, A, R> {
    pub fn new(key_manager: Address, chain_id: u64, account: &'a A, recovery: &'a R) -> Self {
        Self { key_manager, chain_id, account, recovery }
    }

    fn registry(&self) -> PermissionRegistry<'a, A> {
        PermissionRegistry::new(self.account)
    }

    /// Authorise `sender` for `payload` and forward it.
    pub fn execute<L: ReentrancyLock>(
        &self,
        lock: L,
        sender: Address,
        value: U256,
        payload: &[u8],
    ) -> Result<Verified, ExecutionError> {
        let _guard = ReentrancyGuard::acquire(lock).ok_or_else(|| KeyManagerError::reentrant_call(sender))?;

        authorize(&self.registry(), sender, payload, value)?;
        self.forward(sender, value, payload)
    }

    /// Recover the signer of a relay call, authorise them, consume the nonce and forward.
    ///
    /// The counter only stays advanced when the account call succeeds.
    pub fn execute_relay_call<L: ReentrancyLock, N: NonceStore>(
        &self,
        lock: L,
        mut nonces: N,
        sender: Address,
        value: U256,
        signature: &[u8],
        nonce: U256,
        payload: &[u8],
    ) -> Result<Verified, ExecutionError> {
        let _guard = ReentrancyGuard::acquire(lock).ok_or_else(|| KeyManagerError::reentrant_call(sender))?;

        let digest = relay_call_digest(self.key_manager, self.chain_id, nonce, value, payload);
        let signer = self.recovery.recover(digest, signature)?;

        authorize(&self.registry(), signer, payload, value)?;

        let (channel, _) = split_nonce(nonce);
        let counter = nonces.counter(signer, channel);
        validate_relay_nonce(counter, signer, nonce, signature)?;
        let next = counter
            .checked_add(1)
            .ok_or_else(|| KeyManagerError::invalid_relay_nonce(signer, nonce, signature))?;
        nonces.set_counter(signer, channel, next);

        let result = self.forward(signer, value, payload);
        if result.is_err() {
            nonces.set_counter(signer, channel, counter);
        }
        result
    }

    fn forward(&self, signer: Address, value: U256, payload: &[u8]) -> Result<Verified, ExecutionError> {
        let out = self
            .account
            .execute_payload(self.key_manager, value, payload)
            .map_err(ExecutionError::Reverted)?;

        // The account returns `bytes` for execute; setData and ownership calls return nothing.
        let output = if out.is_empty() { out } else { decode_abi_bytes(&out).unwrap_or(out) };

        Ok(Verified { signer, value, selector: payload_selector(payload).unwrap_or_default(), output })
    }

    /// ERC1271: a signature is valid when its signer holds SIGN on the account.
    pub fn is_valid_signature(&self, hash: B256, signature: &[u8]) -> [u8; 4] {
        let Ok(signer) = self.recovery.recover(hash, signature) else {
            return ERC1271_FAILURE_VALUE;
        };
        match self.registry().permissions_of(signer) {
            Ok(permissions) if permissions.has(SIGN) => ERC1271_SUCCESS_VALUE,
            _ => ERC1271_FAILURE_VALUE,
        }
    }
}
