//! Payload classification: which account function a payload calls, and with what arguments.

use alloc::vec::Vec;

use alloy_sol_types::SolCall;
use stylus_sdk::alloy_primitives::{Address, B256, U256};

use crate::{errors::KeyManagerError, interfaces::ILSP0};

/// ERC725X operation types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Call = 0,
    Create = 1,
    Create2 = 2,
    StaticCall = 3,
    DelegateCall = 4,
}

impl TryFrom<U256> for Operation {
    type Error = ();

    fn try_from(value: U256) -> Result<Self, Self::Error> {
        if value > U256::from(4u64) {
            return Err(());
        }
        match value.to::<u8>() {
            0 => Ok(Operation::Call),
            1 => Ok(Operation::Create),
            2 => Ok(Operation::Create2),
            3 => Ok(Operation::StaticCall),
            4 => Ok(Operation::DelegateCall),
            _ => Err(()),
        }
    }
}

/// Decoded `execute(operationType, target, value, data)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecuteCall {
    pub operation: Operation,
    pub target: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

impl ExecuteCall {
    /// Selector of the nested call data; zero-padded when shorter than 4 bytes.
    pub fn selector(&self) -> [u8; 4] {
        padded_selector(&self.data)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classified {
    SetData { key: B256, value: Vec<u8> },
    SetDataBatch { keys: Vec<B256>, values: Vec<Vec<u8>> },
    Execute(ExecuteCall),
    TransferOwnership { new_owner: Address },
    AcceptOwnership,
    RenounceOwnership,
}

impl Classified {
    pub fn selector(&self) -> [u8; 4] {
        match self {
            Classified::SetData { .. } => ILSP0::setDataCall::SELECTOR,
            Classified::SetDataBatch { .. } => ILSP0::setDataBatchCall::SELECTOR,
            Classified::Execute(_) => ILSP0::executeCall::SELECTOR,
            Classified::TransferOwnership { .. } => ILSP0::transferOwnershipCall::SELECTOR,
            Classified::AcceptOwnership => ILSP0::acceptOwnershipCall::SELECTOR,
            Classified::RenounceOwnership => ILSP0::renounceOwnershipCall::SELECTOR,
        }
    }

    /// `(key, value)` pairs written by a setData payload.
    pub fn data_writes(&self) -> Vec<(B256, &[u8])> {
        match self {
            Classified::SetData { key, value } => alloc::vec![(*key, value.as_slice())],
            Classified::SetDataBatch { keys, values } => keys
                .iter()
                .zip(values.iter())
                .map(|(key, value)| (*key, value.as_slice()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Leading function selector of `payload`.
pub fn payload_selector(payload: &[u8]) -> Option<[u8; 4]> {
    let mut selector = [0u8; 4];
    selector.copy_from_slice(payload.get(..4)?);
    Some(selector)
}

/// First four bytes of `data`, zero-padded when it is shorter.
pub fn padded_selector(data: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    let n = data.len().min(4);
    selector[..n].copy_from_slice(&data[..n]);
    selector
}

/// Classify a payload destined for the account. Nothing is partially decoded: any malformed
/// argument rejects the whole payload.
pub fn classify(payload: &[u8]) -> Result<Classified, KeyManagerError> {
    let selector = payload_selector(payload).ok_or_else(|| KeyManagerError::invalid_payload(payload))?;
    let malformed = |_: alloy_sol_types::Error| KeyManagerError::invalid_payload(payload);

    let classified = match selector {
        ILSP0::setDataCall::SELECTOR => {
            let call = ILSP0::setDataCall::abi_decode(payload, true).map_err(malformed)?;
            Classified::SetData { key: call.dataKey, value: call.dataValue.to_vec() }
        }
        ILSP0::setDataBatchCall::SELECTOR => {
            let call = ILSP0::setDataBatchCall::abi_decode(payload, true).map_err(malformed)?;
            if call.dataKeys.is_empty() || call.dataKeys.len() != call.dataValues.len() {
                return Err(KeyManagerError::invalid_payload(payload));
            }
            Classified::SetDataBatch {
                keys: call.dataKeys,
                values: call.dataValues.into_iter().map(|v| v.to_vec()).collect(),
            }
        }
        ILSP0::executeCall::SELECTOR => {
            let call = ILSP0::executeCall::abi_decode(payload, true).map_err(malformed)?;
            let operation = Operation::try_from(call.operationType)
                .map_err(|_| KeyManagerError::invalid_payload(payload))?;
            Classified::Execute(ExecuteCall {
                operation,
                target: call.target,
                value: call.value,
                data: call.data.to_vec(),
            })
        }
        ILSP0::transferOwnershipCall::SELECTOR => {
            let call = ILSP0::transferOwnershipCall::abi_decode(payload, true).map_err(malformed)?;
            Classified::TransferOwnership { new_owner: call.newOwner }
        }
        ILSP0::acceptOwnershipCall::SELECTOR => Classified::AcceptOwnership,
        ILSP0::renounceOwnershipCall::SELECTOR => Classified::RenounceOwnership,
        _ => return Err(KeyManagerError::invalid_function(selector)),
    };

    Ok(classified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylus_sdk::alloy_primitives::Bytes;

    #[test]
    fn short_payload_is_invalid() {
        assert_eq!(classify(&[0x44, 0xc0]), Err(KeyManagerError::invalid_payload(&[0x44, 0xc0])));
        assert_eq!(classify(&[]), Err(KeyManagerError::invalid_payload(&[])));
    }

    #[test]
    fn unknown_selector_is_invalid_function() {
        assert_eq!(
            classify(&[0xde, 0xad, 0xbe, 0xef, 0x00]),
            Err(KeyManagerError::invalid_function([0xde, 0xad, 0xbe, 0xef]))
        );
    }

    #[test]
    fn set_data() {
        let payload = ILSP0::setDataCall {
            dataKey: B256::repeat_byte(0xaa),
            dataValue: Bytes::from_static(b"x"),
        }
        .abi_encode();
        let classified = classify(&payload).unwrap();
        assert_eq!(
            classified,
            Classified::SetData { key: B256::repeat_byte(0xaa), value: b"x".to_vec() }
        );
        assert_eq!(classified.data_writes(), alloc::vec![(B256::repeat_byte(0xaa), &b"x"[..])]);
    }

    #[test]
    fn set_data_batch_lengths_must_match() {
        let mismatched = ILSP0::setDataBatchCall {
            dataKeys: alloc::vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
            dataValues: alloc::vec![Bytes::new()],
        }
        .abi_encode();
        assert_eq!(classify(&mismatched), Err(KeyManagerError::invalid_payload(&mismatched)));

        let empty = ILSP0::setDataBatchCall { dataKeys: alloc::vec![], dataValues: alloc::vec![] }.abi_encode();
        assert_eq!(classify(&empty), Err(KeyManagerError::invalid_payload(&empty)));
    }

    #[test]
    fn execute_extracts_nested_selector() {
        let payload = ILSP0::executeCall {
            operationType: U256::from(0u64),
            target: Address::repeat_byte(0xcc),
            value: U256::from(5u64),
            data: Bytes::from_static(&[0xa9, 0x05, 0x9c, 0xbb, 0x01]),
        }
        .abi_encode();
        let Classified::Execute(call) = classify(&payload).unwrap() else {
            panic!("expected execute");
        };
        assert_eq!(call.operation, Operation::Call);
        assert_eq!(call.target, Address::repeat_byte(0xcc));
        assert_eq!(call.value, U256::from(5u64));
        assert_eq!(call.selector(), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn short_nested_data_is_zero_padded() {
        let call = ExecuteCall {
            operation: Operation::Call,
            target: Address::ZERO,
            value: U256::ZERO,
            data: alloc::vec![0xab],
        };
        assert_eq!(call.selector(), [0xab, 0, 0, 0]);
        assert_eq!(padded_selector(&[]), [0u8; 4]);
        assert_eq!(padded_selector(&[1, 2, 3, 4, 5]), [1, 2, 3, 4]);
    }

    #[test]
    fn unknown_operation_type_is_invalid() {
        let payload = ILSP0::executeCall {
            operationType: U256::from(5u64),
            target: Address::ZERO,
            value: U256::ZERO,
            data: Bytes::new(),
        }
        .abi_encode();
        assert_eq!(classify(&payload), Err(KeyManagerError::invalid_payload(&payload)));
    }

    #[test]
    fn truncated_arguments_are_invalid() {
        let mut payload = ILSP0::transferOwnershipCall { newOwner: Address::repeat_byte(0x01) }.abi_encode();
        payload.truncate(20);
        assert_eq!(classify(&payload), Err(KeyManagerError::invalid_payload(&payload)));
    }

    #[test]
    fn ownership_selectors() {
        let transfer = ILSP0::transferOwnershipCall { newOwner: Address::repeat_byte(0x01) }.abi_encode();
        assert_eq!(
            classify(&transfer).unwrap(),
            Classified::TransferOwnership { new_owner: Address::repeat_byte(0x01) }
        );
        assert_eq!(
            classify(&ILSP0::acceptOwnershipCall {}.abi_encode()).unwrap(),
            Classified::AcceptOwnership
        );
        assert_eq!(
            classify(&ILSP0::renounceOwnershipCall {}.abi_encode()).unwrap(),
            Classified::RenounceOwnership
        );
    }
}
