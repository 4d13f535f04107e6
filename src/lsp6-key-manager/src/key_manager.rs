//! Stylus entrypoint: an LSP6 Key Manager deployed on-chain in front of one LSP0 account.
//!
//! The account must list this contract as its owner; every privileged call goes through
//! `execute` (the caller is the controller) or `executeRelayCall` (the signer is).

use alloc::vec::Vec;

use lsp6_key_manager_types::keys;
use stylus_sdk::{
    abi::Bytes,
    alloy_primitives::{Address, FixedBytes, U256},
    alloy_sol_types::sol,
    prelude::*,
    stylus_core::log,
};

use crate::{
    account::onchain::OnchainAccount,
    constants::{ERC1271_FAILURE_VALUE, INTERFACE_ID_ERC1271, INTERFACE_ID_ERC165, INTERFACE_ID_LSP6},
    errors::{AlreadyInitialized, KeyManagerError, NotInitialized},
    gateway::{nonce_slot, Gateway, Verified},
    registry::PermissionRegistry,
    relay::compose_nonce,
    utils::crypto::PrecompileRecovery,
};

sol! {
    event VerifiedCall(address indexed signer, uint256 indexed value, bytes4 indexed selector);
}

sol_storage! {
    #[entrypoint]
    pub struct LSP6KeyManager {
        /// The controlled LSP0 account; zero until `initialize`.
        address target;

        /// Set while `execute` / `executeRelayCall` is running.
        bool reentrancy_status;

        /// Relay counters keyed by `keccak256(signer || channel)`.
        mapping(bytes32 => uint256) nonce_store;
    }
}

#[public]
impl LSP6KeyManager {
    /// One-time binding to the account this key manager controls.
    pub fn initialize(&mut self, target: Address) -> Result<(), KeyManagerError> {
        let current = self.target.get();
        if current != Address::ZERO {
            return Err(KeyManagerError::AlreadyInitialized(AlreadyInitialized { target: current }));
        }
        self.target.set(target);
        Ok(())
    }

    pub fn target(&self) -> Address {
        self.target.get()
    }

    #[payable]
    pub fn execute(&mut self, payload: Bytes) -> Result<Bytes, Vec<u8>> {
        let sender = self.vm().msg_sender();
        let value = self.vm().msg_value();
        let (key_manager, chain_id) = (self.vm().contract_address(), self.vm().chain_id());
        let account = self.account().map_err(|err| err.revert_data())?;

        let verified = Gateway::new(key_manager, chain_id, &account, &PrecompileRecovery)
            .execute(&mut self.reentrancy_status, sender, value, &payload)
            .map_err(|err| err.revert_data())?;

        self.emit_verified_call(&verified);
        Ok(verified.output.into())
    }

    #[payable]
    pub fn execute_relay_call(&mut self, signature: Bytes, nonce: U256, payload: Bytes) -> Result<Bytes, Vec<u8>> {
        let sender = self.vm().msg_sender();
        let value = self.vm().msg_value();
        let (key_manager, chain_id) = (self.vm().contract_address(), self.vm().chain_id());
        let account = self.account().map_err(|err| err.revert_data())?;

        let verified = Gateway::new(key_manager, chain_id, &account, &PrecompileRecovery)
            .execute_relay_call(
                &mut self.reentrancy_status,
                &mut self.nonce_store,
                sender,
                value,
                &signature,
                nonce,
                &payload,
            )
            .map_err(|err| err.revert_data())?;

        self.emit_verified_call(&verified);
        Ok(verified.output.into())
    }

    pub fn get_nonce(&self, from: Address, channel_id: u128) -> U256 {
        let counter = self.nonce_store.get(nonce_slot(from, channel_id));
        compose_nonce(channel_id, counter.saturating_to::<u128>())
    }

    pub fn supports_interface(&self, interface_id: FixedBytes<4>) -> bool {
        [INTERFACE_ID_ERC165, INTERFACE_ID_ERC1271, INTERFACE_ID_LSP6].contains(&interface_id.0)
    }

    /// ERC1271: valid iff the recovered signer holds SIGN on the account.
    pub fn is_valid_signature(&self, data_hash: FixedBytes<32>, signature: Bytes) -> FixedBytes<4> {
        let Ok(account) = self.account() else {
            return FixedBytes(ERC1271_FAILURE_VALUE);
        };
        let (key_manager, chain_id) = (self.vm().contract_address(), self.vm().chain_id());
        let gateway = Gateway::new(key_manager, chain_id, &account, &PrecompileRecovery);
        FixedBytes(gateway.is_valid_signature(data_hash, &signature))
    }

    pub fn get_permissions_for(&self, controller: Address) -> Result<U256, KeyManagerError> {
        let account = self.account()?;
        Ok(PermissionRegistry::new(&account).permissions_of(controller)?.bits())
    }

    pub fn get_allowed_calls_for(&self, controller: Address) -> Result<Bytes, KeyManagerError> {
        let account = self.account()?;
        Ok(PermissionRegistry::new(&account).get(keys::allowed_calls_key(controller))?.into())
    }

    #[selector(name = "getAllowedERC725YDataKeysFor")]
    pub fn get_allowed_erc725y_data_keys_for(&self, controller: Address) -> Result<Bytes, KeyManagerError> {
        let account = self.account()?;
        Ok(PermissionRegistry::new(&account).allowed_data_keys_raw(controller)?.into())
    }
}

impl LSP6KeyManager {
    fn account(&self) -> Result<OnchainAccount, KeyManagerError> {
        let target = self.target.get();
        if target == Address::ZERO {
            return Err(KeyManagerError::NotInitialized(NotInitialized {}));
        }
        Ok(OnchainAccount::new(target))
    }

    fn emit_verified_call(&self, verified: &Verified) {
        log(
            self.vm(),
            VerifiedCall { signer: verified.signer, value: verified.value, selector: FixedBytes(verified.selector) },
        );
    }
}
