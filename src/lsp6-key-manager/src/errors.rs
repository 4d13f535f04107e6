use alloc::{string::String, vec::Vec};

use alloy_sol_types::{sol, SolError};
use stylus_sdk::{
    alloy_primitives::{Address, Bytes, FixedBytes, U256},
    stylus_proc::SolidityError,
};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    error NotAuthorised(address from, string permission);
    #[derive(Debug, PartialEq, Eq)]
    error NoPermissionsSet(address from);
    #[derive(Debug, PartialEq, Eq)]
    error NotAllowedCall(address from, address to, bytes4 selector);
    #[derive(Debug, PartialEq, Eq)]
    error NoCallsAllowed(address from);
    #[derive(Debug, PartialEq, Eq)]
    error NotAllowedERC725YKey(address from, bytes32 disallowedKey);
    #[derive(Debug, PartialEq, Eq)]
    error NoERC725YDataKeysAllowed(address from);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidWhitelistedCall(address from);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidEncodedAllowedCalls(bytes allowedCallsValue);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidEncodedAllowedERC725YDataKeys(bytes value);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidEncodedPermissions(bytes value);
    #[derive(Debug, PartialEq, Eq)]
    error NotRecognisedPermissionKey(bytes32 dataKey);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidDataValuesForDataKeys(bytes32 dataKey, bytes dataValue);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidRelayNonce(address signer, uint256 invalidNonce, bytes signature);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidRelaySignature();
    #[derive(Debug, PartialEq, Eq)]
    error InvalidERC725Function(bytes4 invalidFunction);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidPayload(bytes payload);
    #[derive(Debug, PartialEq, Eq)]
    error CannotSendValueToSetData();
    #[derive(Debug, PartialEq, Eq)]
    error ReentrantCall(address caller);
    #[derive(Debug, PartialEq, Eq)]
    error TargetReadFailed(address target);
    #[derive(Debug, PartialEq, Eq)]
    error AlreadyInitialized(address target);
    #[derive(Debug, PartialEq, Eq)]
    error NotInitialized();
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    error OwnableCallerNotTheOwner(address callerAddress);
    #[derive(Debug, PartialEq, Eq)]
    error CannotTransferOwnershipToSelf();
    #[derive(Debug, PartialEq, Eq)]
    error LSP14CallerNotPendingOwner(address caller);
    #[derive(Debug, PartialEq, Eq)]
    error LSP14MustAcceptOwnershipInSeparateTransaction();
    #[derive(Debug, PartialEq, Eq)]
    error NotInRenounceOwnershipInterval(uint256 renounceOwnershipStart, uint256 renounceOwnershipEnd);
}

/// Reasons the key manager refuses a request before (or instead of) forwarding it.
#[derive(SolidityError, Debug, PartialEq, Eq)]
pub enum KeyManagerError {
    NotAuthorised(NotAuthorised),
    NoPermissionsSet(NoPermissionsSet),
    NotAllowedCall(NotAllowedCall),
    NoCallsAllowed(NoCallsAllowed),
    NotAllowedERC725YKey(NotAllowedERC725YKey),
    NoERC725YDataKeysAllowed(NoERC725YDataKeysAllowed),
    InvalidWhitelistedCall(InvalidWhitelistedCall),
    InvalidEncodedAllowedCalls(InvalidEncodedAllowedCalls),
    InvalidEncodedAllowedERC725YDataKeys(InvalidEncodedAllowedERC725YDataKeys),
    InvalidEncodedPermissions(InvalidEncodedPermissions),
    NotRecognisedPermissionKey(NotRecognisedPermissionKey),
    InvalidDataValuesForDataKeys(InvalidDataValuesForDataKeys),
    InvalidRelayNonce(InvalidRelayNonce),
    InvalidRelaySignature(InvalidRelaySignature),
    InvalidERC725Function(InvalidERC725Function),
    InvalidPayload(InvalidPayload),
    CannotSendValueToSetData(CannotSendValueToSetData),
    ReentrantCall(ReentrantCall),
    TargetReadFailed(TargetReadFailed),
    AlreadyInitialized(AlreadyInitialized),
    NotInitialized(NotInitialized),
}

impl KeyManagerError {
    pub fn not_authorised(from: Address, permission: &str) -> Self {
        Self::NotAuthorised(NotAuthorised { from, permission: String::from(permission) })
    }

    pub fn no_permissions_set(from: Address) -> Self {
        Self::NoPermissionsSet(NoPermissionsSet { from })
    }

    pub fn not_allowed_call(from: Address, to: Address, selector: [u8; 4]) -> Self {
        Self::NotAllowedCall(NotAllowedCall { from, to, selector: FixedBytes(selector) })
    }

    pub fn no_calls_allowed(from: Address) -> Self {
        Self::NoCallsAllowed(NoCallsAllowed { from })
    }

    pub fn not_allowed_data_key(from: Address, key: FixedBytes<32>) -> Self {
        Self::NotAllowedERC725YKey(NotAllowedERC725YKey { from, disallowedKey: key })
    }

    pub fn no_data_keys_allowed(from: Address) -> Self {
        Self::NoERC725YDataKeysAllowed(NoERC725YDataKeysAllowed { from })
    }

    pub fn invalid_whitelisted_call(from: Address) -> Self {
        Self::InvalidWhitelistedCall(InvalidWhitelistedCall { from })
    }

    pub fn invalid_encoded_allowed_calls(value: &[u8]) -> Self {
        Self::InvalidEncodedAllowedCalls(InvalidEncodedAllowedCalls {
            allowedCallsValue: Bytes::copy_from_slice(value),
        })
    }

    pub fn invalid_encoded_allowed_data_keys(value: &[u8]) -> Self {
        Self::InvalidEncodedAllowedERC725YDataKeys(InvalidEncodedAllowedERC725YDataKeys {
            value: Bytes::copy_from_slice(value),
        })
    }

    pub fn invalid_encoded_permissions(value: &[u8]) -> Self {
        Self::InvalidEncodedPermissions(InvalidEncodedPermissions { value: Bytes::copy_from_slice(value) })
    }

    pub fn not_recognised_permission_key(key: FixedBytes<32>) -> Self {
        Self::NotRecognisedPermissionKey(NotRecognisedPermissionKey { dataKey: key })
    }

    pub fn invalid_data_value(key: FixedBytes<32>, value: &[u8]) -> Self {
        Self::InvalidDataValuesForDataKeys(InvalidDataValuesForDataKeys {
            dataKey: key,
            dataValue: Bytes::copy_from_slice(value),
        })
    }

    pub fn invalid_relay_nonce(signer: Address, nonce: U256, signature: &[u8]) -> Self {
        Self::InvalidRelayNonce(InvalidRelayNonce {
            signer,
            invalidNonce: nonce,
            signature: Bytes::copy_from_slice(signature),
        })
    }

    pub fn invalid_relay_signature() -> Self {
        Self::InvalidRelaySignature(InvalidRelaySignature {})
    }

    pub fn invalid_function(selector: [u8; 4]) -> Self {
        Self::InvalidERC725Function(InvalidERC725Function { invalidFunction: FixedBytes(selector) })
    }

    pub fn invalid_payload(payload: &[u8]) -> Self {
        Self::InvalidPayload(InvalidPayload { payload: Bytes::copy_from_slice(payload) })
    }

    pub fn cannot_send_value_to_set_data() -> Self {
        Self::CannotSendValueToSetData(CannotSendValueToSetData {})
    }

    pub fn reentrant_call(caller: Address) -> Self {
        Self::ReentrantCall(ReentrantCall { caller })
    }

    pub fn target_read_failed(target: Address) -> Self {
        Self::TargetReadFailed(TargetReadFailed { target })
    }

    /// ABI-encoded revert data (selector + arguments).
    pub fn revert_data(&self) -> Vec<u8> {
        match self {
            Self::NotAuthorised(e) => e.abi_encode(),
            Self::NoPermissionsSet(e) => e.abi_encode(),
            Self::NotAllowedCall(e) => e.abi_encode(),
            Self::NoCallsAllowed(e) => e.abi_encode(),
            Self::NotAllowedERC725YKey(e) => e.abi_encode(),
            Self::NoERC725YDataKeysAllowed(e) => e.abi_encode(),
            Self::InvalidWhitelistedCall(e) => e.abi_encode(),
            Self::InvalidEncodedAllowedCalls(e) => e.abi_encode(),
            Self::InvalidEncodedAllowedERC725YDataKeys(e) => e.abi_encode(),
            Self::InvalidEncodedPermissions(e) => e.abi_encode(),
            Self::NotRecognisedPermissionKey(e) => e.abi_encode(),
            Self::InvalidDataValuesForDataKeys(e) => e.abi_encode(),
            Self::InvalidRelayNonce(e) => e.abi_encode(),
            Self::InvalidRelaySignature(e) => e.abi_encode(),
            Self::InvalidERC725Function(e) => e.abi_encode(),
            Self::InvalidPayload(e) => e.abi_encode(),
            Self::CannotSendValueToSetData(e) => e.abi_encode(),
            Self::ReentrantCall(e) => e.abi_encode(),
            Self::TargetReadFailed(e) => e.abi_encode(),
            Self::AlreadyInitialized(e) => e.abi_encode(),
            Self::NotInitialized(e) => e.abi_encode(),
        }
    }
}

/// Outcome of a failed `execute` / `executeRelayCall`.
#[derive(Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// Rejected by the key manager itself.
    KeyManager(KeyManagerError),
    /// The account (or something it called) reverted; data is passed through untouched.
    Reverted(Vec<u8>),
}

impl ExecutionError {
    pub fn revert_data(&self) -> Vec<u8> {
        match self {
            ExecutionError::KeyManager(err) => err.revert_data(),
            ExecutionError::Reverted(data) => data.clone(),
        }
    }
}

impl From<KeyManagerError> for ExecutionError {
    fn from(err: KeyManagerError) -> Self {
        ExecutionError::KeyManager(err)
    }
}

/// LSP14 ownership failures raised by the account.
#[derive(Debug, PartialEq, Eq)]
pub enum OwnableError {
    CallerNotTheOwner(OwnableCallerNotTheOwner),
    CannotTransferOwnershipToSelf(CannotTransferOwnershipToSelf),
    CallerNotPendingOwner(LSP14CallerNotPendingOwner),
    MustAcceptOwnershipInSeparateTransaction(LSP14MustAcceptOwnershipInSeparateTransaction),
    NotInRenounceOwnershipInterval(NotInRenounceOwnershipInterval),
}

impl OwnableError {
    pub fn caller_not_the_owner(caller: Address) -> Self {
        Self::CallerNotTheOwner(OwnableCallerNotTheOwner { callerAddress: caller })
    }

    pub fn revert_data(&self) -> Vec<u8> {
        match self {
            Self::CallerNotTheOwner(e) => e.abi_encode(),
            Self::CannotTransferOwnershipToSelf(e) => e.abi_encode(),
            Self::CallerNotPendingOwner(e) => e.abi_encode(),
            Self::MustAcceptOwnershipInSeparateTransaction(e) => e.abi_encode(),
            Self::NotInRenounceOwnershipInterval(e) => e.abi_encode(),
        }
    }
}
