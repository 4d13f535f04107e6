//! Permission registry: controller permissions and allow-lists, read from the account's ERC725Y store.

use alloc::vec::Vec;

use lsp6_key_manager_types::{
    allowed_calls::{self, AllowedCall, AllowedCallsError},
    keys, Erc725Account, Permissions,
};
use stylus_sdk::alloy_primitives::{Address, B256};

use crate::errors::KeyManagerError;

pub struct PermissionRegistry<'a, A: Erc725Account> {
    account: &'a A,
}

impl<'a, A: Erc725Account> PermissionRegistry<'a, A> {
    pub fn new(account: &'a A) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &A {
        self.account
    }

    /// Raw ERC725Y value under `key`.
    pub fn get(&self, key: B256) -> Result<Vec<u8>, KeyManagerError> {
        self.account
            .get_data(key)
            .map_err(|_| KeyManagerError::target_read_failed(self.account.address()))
    }

    pub fn permissions_of(&self, controller: Address) -> Result<Permissions, KeyManagerError> {
        let raw = self.get(keys::permissions_key(controller))?;
        Ok(Permissions::from_data_value(&raw))
    }

    /// Decoded Allowed Calls of `controller`. An all-wildcard entry found at read time is
    /// reported as `InvalidWhitelistedCall`.
    pub fn allowed_calls_of(&self, controller: Address) -> Result<Vec<AllowedCall>, KeyManagerError> {
        let raw = self.get(keys::allowed_calls_key(controller))?;
        allowed_calls::decode(&raw).map_err(|err| match err {
            AllowedCallsError::AllWildcards { .. } => KeyManagerError::invalid_whitelisted_call(controller),
            _ => KeyManagerError::invalid_encoded_allowed_calls(&raw),
        })
    }

    /// Raw Allowed ERC725Y data keys of `controller` (decode with `allowed_keys::decode`).
    pub fn allowed_data_keys_raw(&self, controller: Address) -> Result<Vec<u8>, KeyManagerError> {
        self.get(keys::allowed_data_keys_key(controller))
    }

    /// Current `AddressPermissions[]` length; a value that is not 16 bytes reads as 0.
    pub fn permissions_array_length(&self) -> Result<u128, KeyManagerError> {
        let raw = self.get(keys::ADDRESS_PERMISSIONS_ARRAY)?;
        Ok(decode_array_length(&raw).unwrap_or(0))
    }

    /// ERC165 probe of a call target.
    pub fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool {
        self.account.supports_interface(contract, interface_id)
    }
}

pub fn decode_array_length(value: &[u8]) -> Option<u128> {
    let bytes: [u8; 16] = value.try_into().ok()?;
    Some(u128::from_be_bytes(bytes))
}
