//! The account a key manager controls, as seen from the key manager.

use alloc::{rc::Rc, vec::Vec};
use alloy_primitives::{Address, B256, U256};

/// Errors while reading from the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountError {
    /// The underlying call failed.
    CallFailed,
    /// Return data was malformed or could not be decoded.
    MalformedReturn,
}

/// ERC725 account abstraction, implemented differently on-chain vs in tests.
pub trait Erc725Account {
    fn address(&self) -> Address;

    /// ERC725Y `getData(key)`; unset keys read as empty.
    fn get_data(&self, key: B256) -> Result<Vec<u8>, AccountError>;

    /// Forward a raw payload to the account as `caller`, attaching `value`.
    /// Returns the raw return data, or the raw revert data on failure.
    fn execute_payload(&self, caller: Address, value: U256, payload: &[u8]) -> Result<Vec<u8>, Vec<u8>>;

    /// ERC165 probe of an arbitrary contract.
    fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool;
}

impl<T: Erc725Account + ?Sized> Erc725Account for &T {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn get_data(&self, key: B256) -> Result<Vec<u8>, AccountError> {
        (**self).get_data(key)
    }

    fn execute_payload(&self, caller: Address, value: U256, payload: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        (**self).execute_payload(caller, value, payload)
    }

    fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool {
        (**self).supports_interface(contract, interface_id)
    }
}

impl<T: Erc725Account + ?Sized> Erc725Account for Rc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn get_data(&self, key: B256) -> Result<Vec<u8>, AccountError> {
        (**self).get_data(key)
    }

    fn execute_payload(&self, caller: Address, value: U256, payload: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        (**self).execute_payload(caller, value, payload)
    }

    fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool {
        (**self).supports_interface(contract, interface_id)
    }
}
