use alloc::vec::Vec;

use alloy_sol_types::SolCall;
use lsp6_key_manager_types::{AccountError, Erc725Account};
use stylus_sdk::{
    alloy_primitives::{Address, B256, U256},
    call::RawCall,
};

use crate::{
    constants::ERC165_PROBE_GAS,
    interfaces::{IERC165, ILSP0},
    utils::bytes::{decode_abi_bytes, decode_bool_word},
};

/// A deployed LSP0 account, reached through raw calls from the key manager contract.
#[derive(Clone, Copy, Debug)]
pub struct OnchainAccount {
    target: Address,
}

impl OnchainAccount {
    pub fn new(target: Address) -> Self {
        Self { target }
    }
}

impl Erc725Account for OnchainAccount {
    fn address(&self) -> Address {
        self.target
    }

    fn get_data(&self, key: B256) -> Result<Vec<u8>, AccountError> {
        let data = ILSP0::getDataCall { dataKey: key }.abi_encode();
        let out = unsafe { RawCall::new_static().call(self.target, &data) }
            .map_err(|_| AccountError::CallFailed)?;
        decode_abi_bytes(&out).map_err(|_| AccountError::MalformedReturn)
    }

    /// The contract itself is the caller on-chain, so `_caller` is implied.
    fn execute_payload(&self, _caller: Address, value: U256, payload: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        unsafe { RawCall::new_with_value(value).call(self.target, payload) }
    }

    fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool {
        let data = IERC165::supportsInterfaceCall { interfaceId: interface_id.into() }.abi_encode();
        match unsafe { RawCall::new_static().gas(ERC165_PROBE_GAS).call(contract, &data) } {
            Ok(out) => decode_bool_word(&out).unwrap_or(false),
            Err(_) => false,
        }
    }
}
