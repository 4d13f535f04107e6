//! Policy evaluation: may `controller` perform the classified call?

use lsp6_key_manager_types::{
    allowed_calls::{self, CALL_TYPE_CALL, CALL_TYPE_DELEGATECALL, CALL_TYPE_STATICCALL, CALL_TYPE_VALUE},
    allowed_keys, classify_data_key,
    permissions::{self as perm, name_of},
    DataKeyKind, Erc725Account, Permissions,
};
use stylus_sdk::alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;

use crate::{
    classifier::{classify, Classified, ExecuteCall, Operation},
    errors::KeyManagerError,
    interfaces::ILSP0,
    registry::{decode_array_length, PermissionRegistry},
};

/// Classify `payload` and check that `controller` may send it. A controller holding no
/// permission at all is refused before the payload is decoded.
pub fn authorize<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
    payload: &[u8],
    msg_value: U256,
) -> Result<Classified, KeyManagerError> {
    if payload.len() < 4 {
        return Err(KeyManagerError::invalid_payload(payload));
    }
    let permissions = granted_permissions(registry, controller)?;
    let call = classify(payload)?;
    check_call(registry, controller, permissions, &call, msg_value)?;
    Ok(call)
}

/// Decide whether `controller` may send `call` (with `msg_value` attached) to the account.
///
/// Structural rejections (value sent to setData, malformed LSP6 values, ownership functions
/// the key manager never forwards) apply to every controller; the `ALL_PERMISSIONS` sentinel
/// skips the permission and allow-list checks only.
pub fn verify_permissions<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
    call: &Classified,
    msg_value: U256,
) -> Result<(), KeyManagerError> {
    let permissions = granted_permissions(registry, controller)?;
    check_call(registry, controller, permissions, call, msg_value)
}

fn granted_permissions<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
) -> Result<Permissions, KeyManagerError> {
    let permissions = registry.permissions_of(controller)?;
    if permissions.is_empty() {
        return Err(KeyManagerError::no_permissions_set(controller));
    }
    Ok(permissions)
}

fn check_call<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
    permissions: Permissions,
    call: &Classified,
    msg_value: U256,
) -> Result<(), KeyManagerError> {
    match call {
        Classified::SetData { .. } | Classified::SetDataBatch { .. } => {
            if !msg_value.is_zero() {
                return Err(KeyManagerError::cannot_send_value_to_set_data());
            }
            let writes = call.data_writes();
            for (key, value) in &writes {
                validate_data_value(*key, value)?;
            }
            if permissions.is_all() {
                return Ok(());
            }
            for (key, value) in &writes {
                verify_data_write(registry, controller, permissions, *key, value)?;
            }
            Ok(())
        }
        Classified::Execute(exec) => {
            let selector = exec.selector();
            if exec.target == registry.account().address() && is_ownership_selector(selector) {
                return Err(KeyManagerError::invalid_function(selector));
            }
            if permissions.is_all() {
                return Ok(());
            }
            verify_execute(registry, controller, permissions, exec)
        }
        Classified::TransferOwnership { .. } => {
            if permissions.is_all() || permissions.has(perm::CHANGEOWNER) {
                return Ok(());
            }
            Err(KeyManagerError::not_authorised(controller, "TRANSFEROWNERSHIP"))
        }
        // The account itself checks that its caller is the pending owner.
        Classified::AcceptOwnership => Ok(()),
        Classified::RenounceOwnership => Err(KeyManagerError::invalid_function(call.selector())),
    }
}

fn is_ownership_selector(selector: [u8; 4]) -> bool {
    selector == ILSP0::transferOwnershipCall::SELECTOR
        || selector == ILSP0::acceptOwnershipCall::SELECTOR
        || selector == ILSP0::renounceOwnershipCall::SELECTOR
}

/// Encoding checks for values written under LSP6 keys.
pub fn validate_data_value(key: B256, value: &[u8]) -> Result<(), KeyManagerError> {
    match classify_data_key(&key) {
        DataKeyKind::Permissions(_) => {
            if !value.is_empty() && value.len() != 32 {
                return Err(KeyManagerError::invalid_encoded_permissions(value));
            }
        }
        DataKeyKind::AllowedCalls(_) => {
            allowed_calls::validate(value).map_err(|_| KeyManagerError::invalid_encoded_allowed_calls(value))?;
        }
        DataKeyKind::AllowedDataKeys(_) => {
            allowed_keys::validate(value)
                .map_err(|_| KeyManagerError::invalid_encoded_allowed_data_keys(value))?;
        }
        DataKeyKind::UnknownPermissionKey => {
            return Err(KeyManagerError::not_recognised_permission_key(key));
        }
        DataKeyKind::PermissionsArrayLength => {
            if value.len() != 16 {
                return Err(KeyManagerError::invalid_data_value(key, value));
            }
        }
        DataKeyKind::PermissionsArrayElement(_) => {
            if !value.is_empty() && value.len() != 20 {
                return Err(KeyManagerError::invalid_data_value(key, value));
            }
        }
        DataKeyKind::UniversalReceiverDelegate | DataKeyKind::Generic => {}
    }
    Ok(())
}

fn require(
    controller: Address,
    permissions: Permissions,
    permission: U256,
) -> Result<(), KeyManagerError> {
    if permissions.has(permission) {
        return Ok(());
    }
    Err(KeyManagerError::not_authorised(controller, name_of(permission).unwrap_or_default()))
}

/// ADD when nothing is stored yet, CHANGE otherwise.
fn require_add_or_change(
    controller: Address,
    permissions: Permissions,
    adding: bool,
    add: U256,
    change: U256,
) -> Result<(), KeyManagerError> {
    require(controller, permissions, if adding { add } else { change })
}

fn verify_data_write<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
    permissions: Permissions,
    key: B256,
    value: &[u8],
) -> Result<(), KeyManagerError> {
    match classify_data_key(&key) {
        DataKeyKind::Permissions(_) | DataKeyKind::AllowedCalls(_) | DataKeyKind::AllowedDataKeys(_) => {
            let current = registry.get(key)?;
            require_add_or_change(
                controller,
                permissions,
                current.is_empty(),
                perm::ADDPERMISSIONS,
                perm::CHANGEPERMISSIONS,
            )
        }
        DataKeyKind::PermissionsArrayLength => {
            let current = registry.permissions_array_length()?;
            let new_length = decode_array_length(value).unwrap_or(0);
            require_add_or_change(
                controller,
                permissions,
                new_length > current,
                perm::ADDPERMISSIONS,
                perm::CHANGEPERMISSIONS,
            )
        }
        DataKeyKind::PermissionsArrayElement(index) => {
            let length = registry.permissions_array_length()?;
            if index > length {
                return Err(KeyManagerError::not_recognised_permission_key(key));
            }
            require_add_or_change(
                controller,
                permissions,
                index == length,
                perm::ADDPERMISSIONS,
                perm::CHANGEPERMISSIONS,
            )
        }
        DataKeyKind::UniversalReceiverDelegate => {
            let current = registry.get(key)?;
            require_add_or_change(
                controller,
                permissions,
                current.is_empty(),
                perm::ADDUNIVERSALRECEIVERDELEGATE,
                perm::CHANGEUNIVERSALRECEIVERDELEGATE,
            )
        }
        DataKeyKind::UnknownPermissionKey => Err(KeyManagerError::not_recognised_permission_key(key)),
        DataKeyKind::Generic => verify_generic_data_key(registry, controller, permissions, key),
    }
}

fn verify_generic_data_key<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
    permissions: Permissions,
    key: B256,
) -> Result<(), KeyManagerError> {
    if permissions.has(perm::SUPER_SETDATA) {
        return Ok(());
    }
    if !permissions.has(perm::SETDATA) {
        return Err(KeyManagerError::not_authorised(controller, "SETDATA"));
    }

    let raw = registry.allowed_data_keys_raw(controller)?;
    let entries =
        allowed_keys::decode(&raw).map_err(|_| KeyManagerError::invalid_encoded_allowed_data_keys(&raw))?;
    if entries.is_empty() {
        return Err(KeyManagerError::no_data_keys_allowed(controller));
    }
    if !allowed_keys::is_allowed(&entries, &key) {
        return Err(KeyManagerError::not_allowed_data_key(controller, key));
    }
    Ok(())
}

fn verify_execute<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
    permissions: Permissions,
    exec: &ExecuteCall,
) -> Result<(), KeyManagerError> {
    let transfers_value = !exec.value.is_zero();
    let may_transfer_value =
        permissions.has(perm::TRANSFERVALUE) || permissions.has(perm::SUPER_TRANSFERVALUE);

    let (base, super_bit, name, call_type) = match exec.operation {
        Operation::Call => (perm::CALL, perm::SUPER_CALL, "CALL", CALL_TYPE_CALL),
        Operation::StaticCall => (perm::STATICCALL, perm::SUPER_STATICCALL, "STATICCALL", CALL_TYPE_STATICCALL),
        Operation::DelegateCall => {
            (perm::DELEGATECALL, perm::SUPER_DELEGATECALL, "DELEGATECALL", CALL_TYPE_DELEGATECALL)
        }
        Operation::Create | Operation::Create2 => {
            require(controller, permissions, perm::DEPLOY)?;
            if transfers_value && !may_transfer_value {
                return Err(KeyManagerError::not_authorised(controller, "TRANSFERVALUE"));
            }
            return Ok(());
        }
    };

    if !permissions.has(base) && !permissions.has(super_bit) {
        return Err(KeyManagerError::not_authorised(controller, name));
    }
    if transfers_value && !may_transfer_value {
        return Err(KeyManagerError::not_authorised(controller, "TRANSFERVALUE"));
    }

    let mut required = 0u32;
    if !permissions.has(super_bit) {
        required |= call_type;
    }
    if transfers_value && !permissions.has(perm::SUPER_TRANSFERVALUE) {
        required |= CALL_TYPE_VALUE;
    }
    if required == 0 {
        return Ok(());
    }

    verify_allowed_call(registry, controller, exec, required)
}

fn verify_allowed_call<A: Erc725Account>(
    registry: &PermissionRegistry<'_, A>,
    controller: Address,
    exec: &ExecuteCall,
    required_call_types: u32,
) -> Result<(), KeyManagerError> {
    let allowed = registry.allowed_calls_of(controller)?;
    if allowed.is_empty() {
        return Err(KeyManagerError::no_calls_allowed(controller));
    }

    let selector = exec.selector();
    let matched = allowed.iter().any(|entry| {
        entry.permits_call_types(required_call_types)
            && entry.matches_target(exec.target)
            && entry.matches_selector(selector)
            && entry
                .required_interface()
                .map_or(true, |interface_id| registry.supports_interface(exec.target, interface_id))
    });
    if !matched {
        return Err(KeyManagerError::not_allowed_call(controller, exec.target, selector));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{collections::BTreeMap, vec::Vec};
    use core::cell::RefCell;
    use lsp6_key_manager_types::{
        allowed_calls::{AllowedCall, ANY_ADDRESS, ANY_INTERFACE, ANY_SELECTOR},
        keys, AccountError,
    };

    const ACCOUNT: Address = Address::repeat_byte(0xac);
    const ALICE: Address = Address::repeat_byte(0xa1);
    const TARGET: Address = Address::repeat_byte(0x70);
    const TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

    #[derive(Default)]
    struct StubAccount {
        data: RefCell<BTreeMap<B256, Vec<u8>>>,
        interfaces: Vec<(Address, [u8; 4])>,
    }

    impl StubAccount {
        fn set(&self, key: B256, value: &[u8]) {
            self.data.borrow_mut().insert(key, value.to_vec());
        }

        fn grant(&self, controller: Address, permissions: U256) {
            self.set(keys::permissions_key(controller), &permissions.to_be_bytes::<32>());
        }
    }

    impl Erc725Account for StubAccount {
        fn address(&self) -> Address {
            ACCOUNT
        }

        fn get_data(&self, key: B256) -> Result<Vec<u8>, AccountError> {
            Ok(self.data.borrow().get(&key).cloned().unwrap_or_default())
        }

        fn execute_payload(&self, _: Address, _: U256, _: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
            Ok(Vec::new())
        }

        fn supports_interface(&self, contract: Address, interface_id: [u8; 4]) -> bool {
            self.interfaces.contains(&(contract, interface_id))
        }
    }

    fn check(account: &StubAccount, call: &Classified, value: U256) -> Result<(), KeyManagerError> {
        verify_permissions(&PermissionRegistry::new(account), ALICE, call, value)
    }

    fn set_data(key: B256, value: &[u8]) -> Classified {
        Classified::SetData { key, value: value.to_vec() }
    }

    fn call(target: Address, value: u64, data: &[u8]) -> Classified {
        Classified::Execute(ExecuteCall {
            operation: Operation::Call,
            target,
            value: U256::from(value),
            data: data.to_vec(),
        })
    }

    fn allow_calls(account: &StubAccount, entries: &[AllowedCall]) {
        account.set(keys::allowed_calls_key(ALICE), &allowed_calls::encode(entries));
    }

    #[test]
    fn zero_permissions_deny_everything() {
        let account = StubAccount::default();
        for request in [
            set_data(B256::repeat_byte(0xaa), b"x"),
            call(TARGET, 0, &TRANSFER),
            Classified::TransferOwnership { new_owner: TARGET },
            Classified::AcceptOwnership,
            Classified::RenounceOwnership,
        ] {
            assert_eq!(check(&account, &request, U256::ZERO), Err(KeyManagerError::no_permissions_set(ALICE)));
        }
    }

    #[test]
    fn unpermissioned_controller_is_refused_before_decoding() {
        let account = StubAccount::default();
        let registry = PermissionRegistry::new(&account);
        let mut truncated_set_data = ILSP0::setDataCall::SELECTOR.to_vec();
        truncated_set_data.extend_from_slice(&[0u8; 20]);

        for payload in [alloc::vec![0xde, 0xad, 0xbe, 0xef, 0x00], truncated_set_data] {
            assert_eq!(
                authorize(&registry, ALICE, &payload, U256::ZERO),
                Err(KeyManagerError::no_permissions_set(ALICE))
            );
        }
        assert_eq!(
            authorize(&registry, ALICE, &[0xde, 0xad], U256::ZERO),
            Err(KeyManagerError::invalid_payload(&[0xde, 0xad]))
        );

        account.grant(ALICE, perm::SETDATA);
        assert_eq!(
            authorize(&registry, ALICE, &[0xde, 0xad, 0xbe, 0xef, 0x00], U256::ZERO),
            Err(KeyManagerError::invalid_function([0xde, 0xad, 0xbe, 0xef]))
        );
    }

    #[test]
    fn malformed_permission_value_reads_as_none() {
        let account = StubAccount::default();
        account.set(keys::permissions_key(ALICE), &[0x08]);
        assert_eq!(
            check(&account, &call(TARGET, 0, &[]), U256::ZERO),
            Err(KeyManagerError::no_permissions_set(ALICE))
        );
    }

    #[test]
    fn all_permissions_skip_checks_but_not_structural_rejections() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::ALL_PERMISSIONS);
        assert!(check(&account, &call(TARGET, 10, &TRANSFER), U256::ZERO).is_ok());
        assert!(check(&account, &set_data(B256::repeat_byte(0xbb), b"x"), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &Classified::RenounceOwnership, U256::ZERO),
            Err(KeyManagerError::invalid_function(ILSP0::renounceOwnershipCall::SELECTOR))
        );
        assert_eq!(
            check(&account, &set_data(B256::repeat_byte(0xbb), b"x"), U256::from(1u64)),
            Err(KeyManagerError::cannot_send_value_to_set_data())
        );
        let nested = call(ACCOUNT, 0, &ILSP0::transferOwnershipCall { newOwner: TARGET }.abi_encode());
        assert_eq!(
            check(&account, &nested, U256::ZERO),
            Err(KeyManagerError::invalid_function(ILSP0::transferOwnershipCall::SELECTOR))
        );
    }

    #[test]
    fn call_with_empty_allow_list() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::CALL);
        assert_eq!(
            check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO),
            Err(KeyManagerError::no_calls_allowed(ALICE))
        );
    }

    #[test]
    fn call_requires_call_permission() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SETDATA);
        assert_eq!(
            check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "CALL"))
        );
    }

    #[test]
    fn allowed_call_matches_exact_pair_only() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::CALL);
        allow_calls(&account, &[AllowedCall::new(CALL_TYPE_CALL, TARGET, ANY_INTERFACE, TRANSFER)]);

        assert!(check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &call(TARGET, 0, &[0x09, 0x5e, 0xa7, 0xb3]), U256::ZERO),
            Err(KeyManagerError::not_allowed_call(ALICE, TARGET, [0x09, 0x5e, 0xa7, 0xb3]))
        );
        let other = Address::repeat_byte(0x71);
        assert_eq!(
            check(&account, &call(other, 0, &TRANSFER), U256::ZERO),
            Err(KeyManagerError::not_allowed_call(ALICE, other, TRANSFER))
        );
    }

    #[test]
    fn super_call_skips_allow_list() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SUPER_CALL);
        assert!(check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO).is_ok());
    }

    #[test]
    fn value_needs_transfer_value_even_with_super_call() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SUPER_CALL);
        assert_eq!(
            check(&account, &call(TARGET, 1, &[]), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "TRANSFERVALUE"))
        );

        account.grant(ALICE, perm::SUPER_CALL | perm::TRANSFERVALUE);
        // The allow-list still has to grant VALUE.
        assert_eq!(
            check(&account, &call(TARGET, 1, &[]), U256::ZERO),
            Err(KeyManagerError::no_calls_allowed(ALICE))
        );
        allow_calls(&account, &[AllowedCall::new(CALL_TYPE_VALUE, TARGET, ANY_INTERFACE, ANY_SELECTOR)]);
        assert!(check(&account, &call(TARGET, 1, &[]), U256::ZERO).is_ok());

        account.grant(ALICE, perm::SUPER_CALL | perm::SUPER_TRANSFERVALUE);
        assert!(check(&account, &call(Address::repeat_byte(0x99), 1, &[]), U256::ZERO).is_ok());
    }

    #[test]
    fn value_entry_must_carry_value_bit() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::CALL | perm::TRANSFERVALUE);
        allow_calls(&account, &[AllowedCall::new(CALL_TYPE_CALL, TARGET, ANY_INTERFACE, ANY_SELECTOR)]);
        assert!(check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &call(TARGET, 5, &TRANSFER), U256::ZERO),
            Err(KeyManagerError::not_allowed_call(ALICE, TARGET, TRANSFER))
        );
    }

    #[test]
    fn interface_restricted_entry_probes_target() {
        let interface = [0x12, 0x34, 0x56, 0x78];
        let mut account = StubAccount::default();
        account.grant(ALICE, perm::CALL);
        allow_calls(&account, &[AllowedCall::new(CALL_TYPE_CALL, ANY_ADDRESS, interface, ANY_SELECTOR)]);
        assert_eq!(
            check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO),
            Err(KeyManagerError::not_allowed_call(ALICE, TARGET, TRANSFER))
        );
        account.interfaces.push((TARGET, interface));
        assert!(check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO).is_ok());
    }

    #[test]
    fn stored_wildcard_entry_is_invalid_whitelisted_call() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::CALL);
        allow_calls(&account, &[AllowedCall::new(CALL_TYPE_CALL, ANY_ADDRESS, ANY_INTERFACE, ANY_SELECTOR)]);
        assert_eq!(
            check(&account, &call(TARGET, 0, &TRANSFER), U256::ZERO),
            Err(KeyManagerError::invalid_whitelisted_call(ALICE))
        );
    }

    #[test]
    fn delegatecall_is_not_implied_by_call() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SUPER_CALL | perm::CALL);
        let request = Classified::Execute(ExecuteCall {
            operation: Operation::DelegateCall,
            target: TARGET,
            value: U256::ZERO,
            data: TRANSFER.to_vec(),
        });
        assert_eq!(
            check(&account, &request, U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "DELEGATECALL"))
        );
        account.grant(ALICE, perm::SUPER_DELEGATECALL);
        assert!(check(&account, &request, U256::ZERO).is_ok());
    }

    #[test]
    fn staticcall_uses_its_own_bits() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::CALL);
        let request = Classified::Execute(ExecuteCall {
            operation: Operation::StaticCall,
            target: TARGET,
            value: U256::ZERO,
            data: TRANSFER.to_vec(),
        });
        assert_eq!(
            check(&account, &request, U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "STATICCALL"))
        );
        account.grant(ALICE, perm::STATICCALL);
        allow_calls(&account, &[AllowedCall::new(CALL_TYPE_CALL, TARGET, ANY_INTERFACE, ANY_SELECTOR)]);
        assert_eq!(
            check(&account, &request, U256::ZERO),
            Err(KeyManagerError::not_allowed_call(ALICE, TARGET, TRANSFER))
        );
        allow_calls(&account, &[AllowedCall::new(CALL_TYPE_STATICCALL, TARGET, ANY_INTERFACE, ANY_SELECTOR)]);
        assert!(check(&account, &request, U256::ZERO).is_ok());
    }

    #[test]
    fn deploy() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SUPER_CALL);
        let create = |value: u64| {
            Classified::Execute(ExecuteCall {
                operation: Operation::Create2,
                target: Address::ZERO,
                value: U256::from(value),
                data: alloc::vec![0x60, 0x80],
            })
        };
        assert_eq!(check(&account, &create(0), U256::ZERO), Err(KeyManagerError::not_authorised(ALICE, "DEPLOY")));
        account.grant(ALICE, perm::DEPLOY);
        assert!(check(&account, &create(0), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &create(1), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "TRANSFERVALUE"))
        );
    }

    #[test]
    fn set_data_with_allowed_key_prefix() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SETDATA);
        assert_eq!(
            check(&account, &set_data(B256::repeat_byte(0xaa), b"x"), U256::ZERO),
            Err(KeyManagerError::no_data_keys_allowed(ALICE))
        );

        account.set(
            keys::allowed_data_keys_key(ALICE),
            &allowed_keys::encode(&[&[0xaa, 0xaa][..]]).unwrap(),
        );
        let mut allowed = [0xaa; 32];
        allowed[31] = 0x01;
        assert!(check(&account, &set_data(B256::new(allowed), b"x"), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &set_data(B256::repeat_byte(0xbb), b"x"), U256::ZERO),
            Err(KeyManagerError::not_allowed_data_key(ALICE, B256::repeat_byte(0xbb)))
        );
    }

    #[test]
    fn batch_rejects_on_first_disallowed_key() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SETDATA);
        account.set(keys::allowed_data_keys_key(ALICE), &allowed_keys::encode(&[&[0xaa][..]]).unwrap());
        let batch = Classified::SetDataBatch {
            keys: alloc::vec![B256::repeat_byte(0xaa), B256::repeat_byte(0xcc)],
            values: alloc::vec![b"1".to_vec(), b"2".to_vec()],
        };
        assert_eq!(
            check(&account, &batch, U256::ZERO),
            Err(KeyManagerError::not_allowed_data_key(ALICE, B256::repeat_byte(0xcc)))
        );
    }

    #[test]
    fn super_setdata_ignores_allowed_keys() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SUPER_SETDATA);
        assert!(check(&account, &set_data(B256::repeat_byte(0xbb), b"x"), U256::ZERO).is_ok());
        // but not LSP6 keys
        assert_eq!(
            check(&account, &set_data(keys::permissions_key(TARGET), &[0u8; 32]), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "ADDPERMISSIONS"))
        );
    }

    #[test]
    fn add_versus_change_permissions() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::ADDPERMISSIONS);
        let bob_key = keys::permissions_key(TARGET);
        let word = perm::CALL.to_be_bytes::<32>();

        assert!(check(&account, &set_data(bob_key, &word), U256::ZERO).is_ok());
        account.set(bob_key, &word);
        assert_eq!(
            check(&account, &set_data(bob_key, &[0u8; 32]), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "CHANGEPERMISSIONS"))
        );

        account.grant(ALICE, perm::CHANGEPERMISSIONS);
        assert!(check(&account, &set_data(bob_key, &[]), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &set_data(keys::allowed_calls_key(Address::repeat_byte(0x55)), &[]), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "ADDPERMISSIONS"))
        );
    }

    #[test]
    fn permission_values_are_validated() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::ALL_PERMISSIONS);
        assert_eq!(
            check(&account, &set_data(keys::permissions_key(TARGET), &[0x01]), U256::ZERO),
            Err(KeyManagerError::invalid_encoded_permissions(&[0x01]))
        );
        let wildcard = allowed_calls::encode(&[AllowedCall::new(CALL_TYPE_CALL, ANY_ADDRESS, ANY_INTERFACE, ANY_SELECTOR)]);
        assert_eq!(
            check(&account, &set_data(keys::allowed_calls_key(TARGET), &wildcard), U256::ZERO),
            Err(KeyManagerError::invalid_encoded_allowed_calls(&wildcard))
        );
        assert_eq!(
            check(&account, &set_data(keys::allowed_calls_key(TARGET), &[0x00, 0x02, 0x01, 0x02]), U256::ZERO),
            Err(KeyManagerError::invalid_encoded_allowed_calls(&[0x00, 0x02, 0x01, 0x02]))
        );
        assert_eq!(
            check(&account, &set_data(keys::allowed_data_keys_key(TARGET), &[0x00, 0x00]), U256::ZERO),
            Err(KeyManagerError::invalid_encoded_allowed_data_keys(&[0x00, 0x00]))
        );

        let mut unknown = [0u8; 32];
        unknown[..6].copy_from_slice(&keys::ADDRESS_PERMISSIONS_PREFIX);
        unknown[6] = 0x01;
        assert_eq!(
            check(&account, &set_data(B256::new(unknown), b"x"), U256::ZERO),
            Err(KeyManagerError::not_recognised_permission_key(B256::new(unknown)))
        );
    }

    #[test]
    fn permissions_array() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::ADDPERMISSIONS);
        account.set(keys::ADDRESS_PERMISSIONS_ARRAY, &1u128.to_be_bytes());

        assert!(check(&account, &set_data(keys::ADDRESS_PERMISSIONS_ARRAY, &2u128.to_be_bytes()), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &set_data(keys::ADDRESS_PERMISSIONS_ARRAY, &0u128.to_be_bytes()), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "CHANGEPERMISSIONS"))
        );
        assert_eq!(
            check(&account, &set_data(keys::ADDRESS_PERMISSIONS_ARRAY, &[0x02]), U256::ZERO),
            Err(KeyManagerError::invalid_data_value(keys::ADDRESS_PERMISSIONS_ARRAY, &[0x02]))
        );

        let element = |i: u128| keys::permissions_array_element_key(i);
        assert!(check(&account, &set_data(element(1), TARGET.as_slice()), U256::ZERO).is_ok());
        assert_eq!(
            check(&account, &set_data(element(0), TARGET.as_slice()), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "CHANGEPERMISSIONS"))
        );
        assert_eq!(
            check(&account, &set_data(element(2), TARGET.as_slice()), U256::ZERO),
            Err(KeyManagerError::not_recognised_permission_key(element(2)))
        );
        assert_eq!(
            check(&account, &set_data(element(1), &[0x01]), U256::ZERO),
            Err(KeyManagerError::invalid_data_value(element(1), &[0x01]))
        );
    }

    #[test]
    fn universal_receiver_delegate_keys() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::ADDUNIVERSALRECEIVERDELEGATE);
        let key = keys::LSP1_UNIVERSAL_RECEIVER_DELEGATE;
        assert!(check(&account, &set_data(key, TARGET.as_slice()), U256::ZERO).is_ok());
        account.set(key, TARGET.as_slice());
        assert_eq!(
            check(&account, &set_data(key, &[]), U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "CHANGEUNIVERSALRECEIVERDELEGATE"))
        );
    }

    #[test]
    fn transfer_ownership_needs_change_owner() {
        let account = StubAccount::default();
        account.grant(ALICE, perm::SUPER_CALL);
        let request = Classified::TransferOwnership { new_owner: TARGET };
        assert_eq!(
            check(&account, &request, U256::ZERO),
            Err(KeyManagerError::not_authorised(ALICE, "TRANSFEROWNERSHIP"))
        );
        account.grant(ALICE, perm::CHANGEOWNER);
        assert!(check(&account, &request, U256::ZERO).is_ok());
        assert!(check(&account, &Classified::AcceptOwnership, U256::ZERO).is_ok());
    }
}
