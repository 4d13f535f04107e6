//! Host-side LSP0 account and a minimal call-routing "world" to run it in.
//!
//! The world moves native value and routes calls between registered contracts. Balances are
//! rolled back when a call fails; contract state is not, so contracts validate before they
//! mutate.

use alloc::{
    collections::BTreeMap,
    rc::{Rc, Weak},
    vec::Vec,
};
use core::cell::{Cell, RefCell};

use alloy_sol_types::{sol, SolCall, SolError};
use lsp6_key_manager_types::{AccountError, Erc725Account};
use stylus_sdk::alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};

use crate::{
    classifier::{padded_selector, payload_selector, Operation},
    constants::{INTERFACE_ID_ERC165, INTERFACE_ID_LSP0, INTERFACE_ID_LSP1, INTERFACE_ID_LSP14},
    interfaces::{IERC165, ILSP0, ILSP1},
    ownable2step::{Ownable2Step, OwnershipEvent},
    utils::bytes::{encode_abi_bytes, encode_address_word, encode_bool_word, undecodable},
};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    error InsufficientBalance(address from, uint256 balance, uint256 value);
    #[derive(Debug, PartialEq, Eq)]
    error NoExtensionFoundForFunctionSelector(bytes4 functionSelector);
    #[derive(Debug, PartialEq, Eq)]
    error ERC725X_InsufficientBalance(uint256 balance, uint256 value);
    #[derive(Debug, PartialEq, Eq)]
    error ERC725X_UnknownOperationType(uint256 operationTypeProvided);
    #[derive(Debug, PartialEq, Eq)]
    error ERC725X_MsgValueDisallowedInStaticCall();
    #[derive(Debug, PartialEq, Eq)]
    error ERC725X_NoContractBytecodeProvided();
    #[derive(Debug, PartialEq, Eq)]
    error ERC725X_DelegateCallUnsupported();
    #[derive(Debug, PartialEq, Eq)]
    error ERC725Y_DataKeysValuesLengthMismatch();
    #[derive(Debug, PartialEq, Eq)]
    error ERC725Y_DataKeysValuesEmptyArray();
}

/// Something that can be called through the [`World`].
pub trait Contract {
    fn call(&self, world: &World, caller: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>>;

    fn supports_interface(&self, _interface_id: [u8; 4]) -> bool {
        false
    }
}

pub struct World {
    chain_id: u64,
    block_number: Cell<u64>,
    balances: RefCell<BTreeMap<Address, U256>>,
    contracts: RefCell<BTreeMap<Address, Rc<dyn Contract>>>,
}

impl World {
    pub fn new(chain_id: u64) -> Rc<Self> {
        Rc::new(Self {
            chain_id,
            block_number: Cell::new(1),
            balances: RefCell::new(BTreeMap::new()),
            contracts: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn block_number(&self) -> u64 {
        self.block_number.get()
    }

    pub fn mine(&self, blocks: u64) {
        self.block_number.set(self.block_number.get() + blocks);
    }

    pub fn deploy(&self, address: Address, contract: Rc<dyn Contract>) {
        self.contracts.borrow_mut().insert(address, contract);
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.contracts.borrow().contains_key(&address)
    }

    pub fn set_balance(&self, address: Address, amount: U256) {
        self.balances.borrow_mut().insert(address, amount);
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.balances.borrow().get(&address).copied().unwrap_or_default()
    }

    /// Move `value` from `caller` to `to`, then run `to`'s code (if any) with `data`.
    /// Every balance change made during a failed call is undone.
    pub fn call(&self, caller: Address, to: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        let snapshot = self.balances.borrow().clone();
        self.transfer(caller, to, value)?;

        let contract = self.contracts.borrow().get(&to).cloned();
        let Some(contract) = contract else {
            return Ok(Vec::new());
        };

        let result = contract.call(self, caller, value, data);
        if result.is_err() {
            *self.balances.borrow_mut() = snapshot;
        }
        result
    }

    /// ERC165 probe; addresses without code support nothing.
    pub fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool {
        let contract = self.contracts.borrow().get(&contract).cloned();
        contract.map_or(false, |c| c.supports_interface(interface_id))
    }

    fn transfer(&self, from: Address, to: Address, value: U256) -> Result<(), Vec<u8>> {
        if value.is_zero() {
            return Ok(());
        }
        let mut balances = self.balances.borrow_mut();
        let balance = balances.get(&from).copied().unwrap_or_default();
        if balance < value {
            return Err(InsufficientBalance { from, balance, value }.abi_encode());
        }
        balances.insert(from, balance - value);
        let credited = balances.get(&to).copied().unwrap_or_default() + value;
        balances.insert(to, credited);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountEvent {
    DataChanged { key: B256, value: Vec<u8> },
    Executed { operation: Operation, target: Address, value: U256, selector: [u8; 4] },
    ContractCreated { operation: Operation, contract: Address, value: U256 },
    UniversalReceiver { from: Address, value: U256, type_id: B256 },
    ValueReceived { sender: Address, value: U256 },
    Ownership(OwnershipEvent),
}

/// Reference LSP0 account: ERC725Y storage, ERC725X execution and LSP14 ownership.
pub struct MemoryAccount {
    world: Weak<World>,
    address: Address,
    storage: RefCell<BTreeMap<B256, Vec<u8>>>,
    ownable: RefCell<Ownable2Step>,
    create_nonce: Cell<u64>,
    events: RefCell<Vec<AccountEvent>>,
}

impl MemoryAccount {
    /// Create the account at `address`, owned by `owner`, and register it in `world`.
    pub fn deploy(world: &Rc<World>, address: Address, owner: Address) -> Rc<Self> {
        let account = Rc::new(Self {
            world: Rc::downgrade(world),
            address,
            storage: RefCell::new(BTreeMap::new()),
            ownable: RefCell::new(Ownable2Step::new(owner)),
            create_nonce: Cell::new(1),
            events: RefCell::new(Vec::new()),
        });
        world.deploy(address, account.clone());
        account
    }

    pub fn owner(&self) -> Address {
        self.ownable.borrow().owner()
    }

    pub fn pending_owner(&self) -> Address {
        self.ownable.borrow().pending_owner()
    }

    pub fn renounce_ownership_started_at(&self) -> u64 {
        self.ownable.borrow().renounce_started_at()
    }

    pub fn data(&self, key: B256) -> Vec<u8> {
        self.storage.borrow().get(&key).cloned().unwrap_or_default()
    }

    pub fn events(&self) -> Vec<AccountEvent> {
        self.events.borrow().clone()
    }

    fn emit(&self, event: AccountEvent) {
        self.events.borrow_mut().push(event);
    }

    fn only_owner(&self, caller: Address) -> Result<(), Vec<u8>> {
        self.ownable.borrow().only_owner(caller).map_err(|err| err.revert_data())
    }

    fn store(&self, key: B256, value: Vec<u8>) {
        if value.is_empty() {
            self.storage.borrow_mut().remove(&key);
        } else {
            self.storage.borrow_mut().insert(key, value.clone());
        }
        self.emit(AccountEvent::DataChanged { key, value });
    }

    fn execute(
        &self,
        world: &World,
        operation: U256,
        target: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Vec<u8>, Vec<u8>> {
        let balance = world.balance_of(self.address);
        if balance < value {
            return Err(ERC725X_InsufficientBalance { balance, value }.abi_encode());
        }
        let operation = Operation::try_from(operation)
            .map_err(|_| ERC725X_UnknownOperationType { operationTypeProvided: operation }.abi_encode())?;

        let result = match operation {
            Operation::Call => world.call(self.address, target, value, data)?,
            Operation::StaticCall => {
                if !value.is_zero() {
                    return Err(ERC725X_MsgValueDisallowedInStaticCall {}.abi_encode());
                }
                world.call(self.address, target, U256::ZERO, data)?
            }
            Operation::Create | Operation::Create2 => {
                let contract = self.create(world, operation, value, data)?;
                return Ok(encode_abi_bytes(contract.as_slice()));
            }
            Operation::DelegateCall => return Err(ERC725X_DelegateCallUnsupported {}.abi_encode()),
        };

        self.emit(AccountEvent::Executed { operation, target, value, selector: padded_selector(data) });
        Ok(encode_abi_bytes(&result))
    }

    /// Only the address derivation and the value transfer happen here; no code runs.
    fn create(&self, world: &World, operation: Operation, value: U256, data: &[u8]) -> Result<Address, Vec<u8>> {
        let contract = if operation == Operation::Create2 {
            if data.len() <= 32 {
                return Err(ERC725X_NoContractBytecodeProvided {}.abi_encode());
            }
            let (init_code, salt) = data.split_at(data.len() - 32);
            self.address.create2(B256::from_slice(salt), keccak256(init_code))
        } else {
            if data.is_empty() {
                return Err(ERC725X_NoContractBytecodeProvided {}.abi_encode());
            }
            let nonce = self.create_nonce.get();
            self.create_nonce.set(nonce + 1);
            create_address(self.address, nonce)
        };
        world.call(self.address, contract, value, &[])?;
        self.emit(AccountEvent::ContractCreated { operation, contract, value });
        Ok(contract)
    }

    fn transfer_ownership(&self, world: &World, caller: Address, new_owner: Address) -> Result<Vec<u8>, Vec<u8>> {
        let snapshot = self.ownable.borrow().clone();
        let event = self
            .ownable
            .borrow_mut()
            .begin_transfer(caller, new_owner, self.address)
            .map_err(|err| err.revert_data())?;
        let events_before = self.events.borrow().len();
        self.emit(AccountEvent::Ownership(event));

        // The in-progress flag stays set while the nominee is notified.
        if let Err(revert) = self.notify(world, new_owner, b"LSP0OwnershipTransferStarted") {
            *self.ownable.borrow_mut() = snapshot;
            self.events.borrow_mut().truncate(events_before);
            return Err(revert);
        }
        self.ownable.borrow_mut().finish_transfer();
        Ok(Vec::new())
    }

    fn accept_ownership(&self, world: &World, caller: Address) -> Result<Vec<u8>, Vec<u8>> {
        let snapshot = self.ownable.borrow().clone();
        let previous_owner = snapshot.owner();
        let event = self.ownable.borrow_mut().accept(caller).map_err(|err| err.revert_data())?;
        let events_before = self.events.borrow().len();
        self.emit(AccountEvent::Ownership(event));

        let notified = self
            .notify(world, previous_owner, b"LSP0OwnershipTransferred_SenderNotification")
            .and_then(|_| self.notify(world, caller, b"LSP0OwnershipTransferred_RecipientNotification"));
        if let Err(revert) = notified {
            *self.ownable.borrow_mut() = snapshot;
            self.events.borrow_mut().truncate(events_before);
            return Err(revert);
        }
        Ok(Vec::new())
    }

    fn renounce_ownership(&self, world: &World, caller: Address) -> Result<Vec<u8>, Vec<u8>> {
        let events = self
            .ownable
            .borrow_mut()
            .renounce(caller, world.block_number())
            .map_err(|err| err.revert_data())?;
        for event in events {
            self.emit(AccountEvent::Ownership(event));
        }
        Ok(Vec::new())
    }

    /// LSP1 notification; skipped for receivers that do not advertise LSP1.
    fn notify(&self, world: &World, receiver: Address, type_id: &[u8]) -> Result<(), Vec<u8>> {
        if !world.supports_interface(receiver, INTERFACE_ID_LSP1) {
            return Ok(());
        }
        let data = ILSP1::universalReceiverCall { typeId: keccak256(type_id), receivedData: Bytes::new() }
            .abi_encode();
        world.call(self.address, receiver, U256::ZERO, &data).map(|_| ())
    }
}

/// CREATE address: `keccak256(rlp([sender, nonce]))[12..]`.
fn create_address(sender: Address, nonce: u64) -> Address {
    let mut payload = Vec::with_capacity(30);
    payload.push(0x94);
    payload.extend_from_slice(sender.as_slice());
    match nonce {
        0 => payload.push(0x80),
        1..=0x7f => payload.push(nonce as u8),
        _ => {
            let bytes = nonce.to_be_bytes();
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            payload.push(0x80 + (8 - skip) as u8);
            payload.extend_from_slice(&bytes[skip..]);
        }
    }
    let mut rlp = Vec::with_capacity(payload.len() + 1);
    rlp.push(0xc0 + payload.len() as u8);
    rlp.extend_from_slice(&payload);
    Address::from_slice(&keccak256(&rlp)[12..])
}

impl Contract for MemoryAccount {
    fn call(&self, world: &World, caller: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        if data.is_empty() {
            self.emit(AccountEvent::ValueReceived { sender: caller, value });
            return Ok(Vec::new());
        }
        let Some(selector) = payload_selector(data) else {
            let padded = padded_selector(data);
            return Err(NoExtensionFoundForFunctionSelector { functionSelector: FixedBytes(padded) }.abi_encode());
        };

        match selector {
            ILSP0::ownerCall::SELECTOR => Ok(encode_address_word(self.owner())),
            ILSP0::pendingOwnerCall::SELECTOR => Ok(encode_address_word(self.pending_owner())),
            ILSP0::renounceOwnershipStartedAtCall::SELECTOR => {
                Ok(U256::from(self.renounce_ownership_started_at()).to_be_bytes::<32>().to_vec())
            }
            ILSP0::getDataCall::SELECTOR => {
                let call = ILSP0::getDataCall::abi_decode(data, true).map_err(undecodable)?;
                Ok(encode_abi_bytes(&self.data(call.dataKey)))
            }
            ILSP0::getDataBatchCall::SELECTOR => {
                let call = ILSP0::getDataBatchCall::abi_decode(data, true).map_err(undecodable)?;
                let values: Vec<Bytes> = call.dataKeys.iter().map(|key| Bytes::from(self.data(*key))).collect();
                Ok(ILSP0::getDataBatchCall::abi_encode_returns(&(values,)))
            }
            ILSP0::setDataCall::SELECTOR => {
                self.only_owner(caller)?;
                let call = ILSP0::setDataCall::abi_decode(data, true).map_err(undecodable)?;
                self.store(call.dataKey, call.dataValue.to_vec());
                Ok(Vec::new())
            }
            ILSP0::setDataBatchCall::SELECTOR => {
                self.only_owner(caller)?;
                let call = ILSP0::setDataBatchCall::abi_decode(data, true).map_err(undecodable)?;
                if call.dataKeys.len() != call.dataValues.len() {
                    return Err(ERC725Y_DataKeysValuesLengthMismatch {}.abi_encode());
                }
                if call.dataKeys.is_empty() {
                    return Err(ERC725Y_DataKeysValuesEmptyArray {}.abi_encode());
                }
                for (key, value) in call.dataKeys.into_iter().zip(call.dataValues) {
                    self.store(key, value.to_vec());
                }
                Ok(Vec::new())
            }
            ILSP0::executeCall::SELECTOR => {
                self.only_owner(caller)?;
                let call = ILSP0::executeCall::abi_decode(data, true).map_err(undecodable)?;
                self.execute(world, call.operationType, call.target, call.value, &call.data)
            }
            ILSP0::transferOwnershipCall::SELECTOR => {
                let call = ILSP0::transferOwnershipCall::abi_decode(data, true).map_err(undecodable)?;
                self.transfer_ownership(world, caller, call.newOwner)
            }
            ILSP0::acceptOwnershipCall::SELECTOR => self.accept_ownership(world, caller),
            ILSP0::renounceOwnershipCall::SELECTOR => self.renounce_ownership(world, caller),
            IERC165::supportsInterfaceCall::SELECTOR => {
                let call = IERC165::supportsInterfaceCall::abi_decode(data, true).map_err(undecodable)?;
                Ok(encode_bool_word(Contract::supports_interface(self, call.interfaceId.0)))
            }
            ILSP1::universalReceiverCall::SELECTOR => {
                let call = ILSP1::universalReceiverCall::abi_decode(data, true).map_err(undecodable)?;
                self.emit(AccountEvent::UniversalReceiver { from: caller, value, type_id: call.typeId });
                Ok(encode_abi_bytes(&[]))
            }
            _ => Err(NoExtensionFoundForFunctionSelector { functionSelector: FixedBytes(selector) }.abi_encode()),
        }
    }

    fn supports_interface(&self, interface_id: [u8; 4]) -> bool {
        [INTERFACE_ID_ERC165, INTERFACE_ID_LSP0, INTERFACE_ID_LSP1, INTERFACE_ID_LSP14].contains(&interface_id)
    }
}

impl Erc725Account for MemoryAccount {
    fn address(&self) -> Address {
        self.address
    }

    fn get_data(&self, key: B256) -> Result<Vec<u8>, AccountError> {
        Ok(self.data(key))
    }

    fn execute_payload(&self, caller: Address, value: U256, payload: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        match self.world.upgrade() {
            Some(world) => world.call(caller, self.address, value, payload),
            None => Err(Vec::new()),
        }
    }

    fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool {
        self.world.upgrade().map_or(false, |world| world.supports_interface(contract, interface_id))
    }
}
