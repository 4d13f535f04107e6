use alloy_primitives::{Address, FixedBytes, U256};
use serde::Serialize;

/// A request for `executeRelayCall`, signed by a controller and submitted by anyone.
#[derive(Clone, Debug)]
pub struct RelayCall {
    /// Key manager the signature is bound to.
    pub key_manager: Address,
    pub chain_id: u64,
    /// `channel << 128 | index`.
    pub nonce: U256,
    /// Native value the relayer must attach.
    pub value: U256,
    /// Payload forwarded to the account (setData / execute / ownership calls).
    pub payload: Vec<u8>,

    /// `r || s || v` over [`crate::encoder::relay_call_digest`]; empty until signed.
    pub signature: Vec<u8>,
}

/// CLI output for a signed relay call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedRelayCall {
    pub signer: Address,
    pub key_manager: Address,
    pub chain_id: u64,
    pub nonce: U256,
    pub value: U256,
    pub digest: FixedBytes<32>,
    pub payload: String,
    pub signature: String,
}
