//! `lsp6-relay`: sign relay calls and encode LSP6 permission values from the command line.
//!
//! Every command prints JSON to stdout.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use k256::ecdsa::SigningKey;
use lsp6_relay_encoder::{
    encoder::{
        encode_allowed_calls, encode_allowed_data_keys, encode_permissions, relay_call_digest, sign_relay_call,
        signer_address,
    },
    types::{RelayCall, SignedRelayCall},
    AllowedCall,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct RelayArgs {
    /// Key manager the signature is bound to.
    #[arg(long, env = "KEY_MANAGER")]
    key_manager: String,

    #[arg(long, env = "CHAIN_ID")]
    chain_id: u64,

    /// Full nonce (`channel << 128 | index`), decimal or 0x-hex.
    #[arg(long, default_value = "0")]
    nonce: String,

    /// Native value the relayer will attach, in wei.
    #[arg(long, default_value = "0")]
    value: String,

    /// Hex payload for the account (setData / execute / ownership calls).
    #[arg(long)]
    payload: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign an `executeRelayCall` request.
    Sign {
        /// Hex-encoded secp256k1 private key of the controller.
        #[arg(long, env = "PKEY")]
        private_key: String,

        #[command(flatten)]
        relay: RelayArgs,
    },
    /// Print the digest a controller would sign.
    Digest {
        #[command(flatten)]
        relay: RelayArgs,
    },
    /// Encode permission names (e.g. CALL SETDATA) as a 32-byte value.
    EncodePermissions { names: Vec<String> },
    /// Encode Allowed Calls entries given as `callTypes:address:interfaceId:selector` (hex).
    EncodeAllowedCalls { entries: Vec<String> },
    /// Encode Allowed ERC725Y data key prefixes (hex, 1 to 32 bytes each).
    EncodeAllowedKeys { prefixes: Vec<String> },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = match cli.command {
        Command::Sign { private_key, relay } => {
            let key_bytes = decode_hex(&private_key).context("PKEY is not valid hex")?;
            let signing_key = SigningKey::from_slice(&key_bytes).context("invalid private key")?;
            let mut call = relay_call(&relay)?;
            sign_relay_call(&mut call, &signing_key).map_err(|e| anyhow!("signing failed: {e}"))?;

            let signed = SignedRelayCall {
                signer: signer_address(&signing_key),
                key_manager: call.key_manager,
                chain_id: call.chain_id,
                nonce: call.nonce,
                value: call.value,
                digest: relay_call_digest(&call),
                payload: to_hex(&call.payload),
                signature: to_hex(&call.signature),
            };
            serde_json::to_value(signed).context("failed serialising signed relay call")?
        }
        Command::Digest { relay } => {
            let call = relay_call(&relay)?;
            json!({ "digest": relay_call_digest(&call) })
        }
        Command::EncodePermissions { names } => {
            let value = encode_permissions(&names).map_err(|name| anyhow!("unknown permission `{name}`"))?;
            json!({ "permissions": to_hex(&value) })
        }
        Command::EncodeAllowedCalls { entries } => {
            let calls = entries.iter().map(|e| parse_allowed_call(e)).collect::<Result<Vec<_>>>()?;
            json!({ "allowedCalls": to_hex(&encode_allowed_calls(&calls)) })
        }
        Command::EncodeAllowedKeys { prefixes } => {
            let prefixes = prefixes.iter().map(|p| decode_hex(p)).collect::<Result<Vec<_>>>()?;
            let encoded =
                encode_allowed_data_keys(&prefixes).map_err(|e| anyhow!("invalid data key prefix: {e:?}"))?;
            json!({ "allowedDataKeys": to_hex(&encoded) })
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed serialising output")?
    );
    Ok(())
}

fn relay_call(args: &RelayArgs) -> Result<RelayCall> {
    Ok(RelayCall {
        key_manager: Address::from_str(&args.key_manager).context("invalid --key-manager address")?,
        chain_id: args.chain_id,
        nonce: U256::from_str(&args.nonce).context("invalid --nonce")?,
        value: U256::from_str(&args.value).context("invalid --value")?,
        payload: decode_hex(&args.payload).context("invalid --payload hex")?,
        signature: Vec::new(),
    })
}

fn parse_allowed_call(entry: &str) -> Result<AllowedCall> {
    let parts: Vec<&str> = entry.split(':').collect();
    let [call_types, target, interface_id, selector] = parts.as_slice() else {
        return Err(anyhow!("expected `callTypes:address:interfaceId:selector`, got `{entry}`"));
    };
    Ok(AllowedCall::new(
        u32::from_be_bytes(fixed::<4>(call_types).context("callTypes must be 4 bytes")?),
        Address::from_str(target).with_context(|| format!("invalid address `{target}`"))?,
        fixed::<4>(interface_id).context("interfaceId must be 4 bytes")?,
        fixed::<4>(selector).context("selector must be 4 bytes")?,
    ))
}

fn fixed<const N: usize>(s: &str) -> Result<[u8; N]> {
    let bytes = decode_hex(s)?;
    bytes.try_into().map_err(|b: Vec<u8>| anyhow!("expected {N} bytes, got {}", b.len()))
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim().trim_start_matches("0x")).with_context(|| format!("invalid hex `{s}`"))
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
