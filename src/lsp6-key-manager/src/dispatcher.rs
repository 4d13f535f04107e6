//! Host-side key manager: runs the [`Gateway`] against any [`Erc725Account`] and keeps its
//! reentrancy flag, relay counters and `VerifiedCall` log in memory.
//!
//! `execute` authorises the direct caller; `execute_relay_call` authorises whoever signed the
//! payload. Either the payload is forwarded unchanged or the account is left untouched.

use alloc::{collections::BTreeMap, vec::Vec};
use core::cell::{Cell, RefCell};

use alloy_sol_types::SolCall;
use lsp6_key_manager_types::{keys, Erc725Account};
use stylus_sdk::alloy_primitives::{Address, B256, U256};

use crate::{
    account::memory::{Contract, World},
    classifier::payload_selector,
    constants::{INTERFACE_ID_ERC1271, INTERFACE_ID_ERC165, INTERFACE_ID_LSP6},
    errors::{ExecutionError, KeyManagerError},
    gateway::{Gateway, NonceStore, Verified},
    interfaces::{IERC1271, IERC165, ILSP6},
    registry::PermissionRegistry,
    relay::{compose_nonce, SignerRecovery},
    utils::{
        bytes::{encode_abi_bytes, encode_address_word, encode_bool_word, undecodable},
        crypto::Secp256k1Recovery,
    },
};

/// Who is calling the key manager, and with how much native value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub value: U256,
}

impl CallContext {
    pub fn new(sender: Address, value: U256) -> Self {
        Self { sender, value }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyManagerEvent {
    VerifiedCall { signer: Address, value: U256, selector: [u8; 4] },
}

pub struct KeyManager<A: Erc725Account, R: SignerRecovery = Secp256k1Recovery> {
    address: Address,
    chain_id: u64,
    account: A,
    recovery: R,
    nonces: RefCell<BTreeMap<(Address, u128), u128>>,
    entered: Cell<bool>,
    events: RefCell<Vec<KeyManagerEvent>>,
}

impl<A: Erc725Account> KeyManager<A> {
    pub fn new(address: Address, chain_id: u64, account: A) -> Self {
        Self::with_recovery(address, chain_id, account, Secp256k1Recovery)
    }
}

impl<A: Erc725Account, R: SignerRecovery> KeyManager<A, R> {
    pub fn with_recovery(address: Address, chain_id: u64, account: A, recovery: R) -> Self {
        Self {
            address,
            chain_id,
            account,
            recovery,
            nonces: RefCell::new(BTreeMap::new()),
            entered: Cell::new(false),
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// The controlled account.
    pub fn target(&self) -> Address {
        self.account.address()
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    pub fn events(&self) -> Vec<KeyManagerEvent> {
        self.events.borrow().clone()
    }

    fn registry(&self) -> PermissionRegistry<'_, A> {
        PermissionRegistry::new(&self.account)
    }

    fn gateway(&self) -> Gateway<'_, A, R> {
        Gateway::new(self.address, self.chain_id, &self.account, &self.recovery)
    }

    pub fn execute(&self, ctx: CallContext, payload: &[u8]) -> Result<Vec<u8>, ExecutionError> {
        let verified = self.gateway().execute(&self.entered, ctx.sender, ctx.value, payload)?;
        Ok(self.record(verified))
    }

    /// Execute `payload` on behalf of whoever signed it. `ctx.value` is part of the signed digest.
    pub fn execute_relay_call(
        &self,
        ctx: CallContext,
        signature: &[u8],
        nonce: U256,
        payload: &[u8],
    ) -> Result<Vec<u8>, ExecutionError> {
        let verified = self.gateway().execute_relay_call(
            &self.entered,
            &self.nonces,
            ctx.sender,
            ctx.value,
            signature,
            nonce,
            payload,
        )?;
        Ok(self.record(verified))
    }

    fn record(&self, verified: Verified) -> Vec<u8> {
        let Verified { signer, value, selector, output } = verified;
        self.events.borrow_mut().push(KeyManagerEvent::VerifiedCall { signer, value, selector });
        output
    }

    /// Next valid nonce for `signer` on `channel`, with the channel in the upper 128 bits.
    pub fn get_nonce(&self, signer: Address, channel: u128) -> U256 {
        compose_nonce(channel, (&self.nonces).counter(signer, channel))
    }

    pub fn supports_interface(&self, interface_id: [u8; 4]) -> bool {
        [INTERFACE_ID_ERC165, INTERFACE_ID_ERC1271, INTERFACE_ID_LSP6].contains(&interface_id)
    }

    /// ERC1271: a signature is valid when its signer holds SIGN on the account.
    pub fn is_valid_signature(&self, hash: B256, signature: &[u8]) -> [u8; 4] {
        self.gateway().is_valid_signature(hash, signature)
    }

    pub fn get_permissions_for(&self, controller: Address) -> Result<U256, KeyManagerError> {
        Ok(self.registry().permissions_of(controller)?.bits())
    }

    pub fn get_allowed_calls_for(&self, controller: Address) -> Result<Vec<u8>, KeyManagerError> {
        self.registry().get(keys::allowed_calls_key(controller))
    }

    pub fn get_allowed_erc725y_data_keys_for(&self, controller: Address) -> Result<Vec<u8>, KeyManagerError> {
        self.registry().allowed_data_keys_raw(controller)
    }
}

/// Lets the key manager live in a [`World`] next to the account, so it can be called (and
/// re-entered) like a deployed contract.
impl<A: Erc725Account, R: SignerRecovery> Contract for KeyManager<A, R> {
    fn call(&self, _world: &World, caller: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        let selector = payload_selector(data).ok_or_else(Vec::new)?;
        let ctx = CallContext::new(caller, value);

        match selector {
            ILSP6::executeCall::SELECTOR => {
                let call = ILSP6::executeCall::abi_decode(data, true).map_err(undecodable)?;
                let out = self.execute(ctx, &call.payload).map_err(|err| err.revert_data())?;
                Ok(encode_abi_bytes(&out))
            }
            ILSP6::executeRelayCallCall::SELECTOR => {
                let call = ILSP6::executeRelayCallCall::abi_decode(data, true).map_err(undecodable)?;
                let out = self
                    .execute_relay_call(ctx, &call.signature, call.nonce, &call.payload)
                    .map_err(|err| err.revert_data())?;
                Ok(encode_abi_bytes(&out))
            }
            ILSP6::targetCall::SELECTOR => Ok(encode_address_word(self.target())),
            ILSP6::getNonceCall::SELECTOR => {
                let call = ILSP6::getNonceCall::abi_decode(data, true).map_err(undecodable)?;
                Ok(self.get_nonce(call.from, call.channelId).to_be_bytes::<32>().to_vec())
            }
            IERC165::supportsInterfaceCall::SELECTOR => {
                let call = IERC165::supportsInterfaceCall::abi_decode(data, true).map_err(undecodable)?;
                Ok(encode_bool_word(KeyManager::supports_interface(self, call.interfaceId.0)))
            }
            IERC1271::isValidSignatureCall::SELECTOR => {
                let call = IERC1271::isValidSignatureCall::abi_decode(data, true).map_err(undecodable)?;
                let mut word = alloc::vec![0u8; 32];
                word[..4].copy_from_slice(&self.is_valid_signature(call.dataHash, &call.signature));
                Ok(word)
            }
            _ => Err(Vec::new()),
        }
    }

    fn supports_interface(&self, interface_id: [u8; 4]) -> bool {
        KeyManager::supports_interface(self, interface_id)
    }
}
