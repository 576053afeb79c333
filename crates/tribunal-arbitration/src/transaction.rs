//! # Settlement Transaction
//!
//! Encodes `submitVerdict(verdict, signature)` calldata and wraps it in a
//! legacy EIP-155 transaction.
//!
//! Signing preimage: `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`.
//! Signed form: `rlp([nonce, gasPrice, gas, to, value, data, v, r, s])` with
//! `v = recovery_id + 35 + 2 * chainId`. Only this one shape is supported:
//! a call (non-empty `to`) on a chain-id-protected network.

use std::fmt;

use tribunal_core::abi::{encode_call, Token};
use tribunal_core::{function_selector, keccak256, Address, Bytes32, RlpItem};
use tribunal_crypto::{recover_address, KeyProvider, RecoverableSignature};

use crate::error::ArbitrationError;
use crate::verdict::SignedVerdict;

/// Canonical signature of the verifier entry point.
pub const SUBMIT_VERDICT_SIGNATURE: &str =
    "submitVerdict((bytes32,uint8,(bytes32,uint8,uint16,bytes32)[3],uint8,bytes32,bytes32,uint256,bytes32),bytes)";

/// `selector || abi.encode(verdict, signature)`.
pub fn submit_verdict_calldata(signed: &SignedVerdict) -> Vec<u8> {
    encode_call(
        function_selector(SUBMIT_VERDICT_SIGNATURE),
        &[
            signed.verdict().to_token(),
            Token::Bytes(signed.signature().to_bytes().to_vec()),
        ],
    )
}

/// An unsigned legacy transaction.
#[derive(Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    /// Sender nonce.
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Destination contract.
    pub to: Address,
    /// Value in wei.
    pub value: u128,
    /// Calldata.
    pub data: Vec<u8>,
    /// EIP-155 chain id.
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn base_items(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::uint(u128::from(self.nonce)),
            RlpItem::uint(self.gas_price),
            RlpItem::uint(u128::from(self.gas_limit)),
            RlpItem::bytes(self.to.as_bytes().to_vec()),
            RlpItem::uint(self.value),
            RlpItem::bytes(self.data.clone()),
        ]
    }

    /// RLP of the EIP-155 signing preimage.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut items = self.base_items();
        items.push(RlpItem::uint(u128::from(self.chain_id)));
        items.push(RlpItem::uint(0));
        items.push(RlpItem::uint(0));
        RlpItem::List(items).encode()
    }

    /// keccak-256 of [`Self::signing_payload`].
    pub fn signing_hash(&self) -> Bytes32 {
        keccak256(self.signing_payload())
    }

    /// Sign with the operator key.
    pub fn sign(self, signer: &dyn KeyProvider) -> Result<SignedTransaction, ArbitrationError> {
        let signature = signer.sign_prehash(&self.signing_hash())?;
        Ok(SignedTransaction::from_parts(self, signature))
    }
}

impl fmt::Debug for LegacyTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyTransaction")
            .field("nonce", &self.nonce)
            .field("gas_price", &self.gas_price)
            .field("gas_limit", &self.gas_limit)
            .field("to", &self.to)
            .field("value", &self.value)
            .field("data_len", &self.data.len())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// A signed legacy transaction and its raw encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    transaction: LegacyTransaction,
    signature: RecoverableSignature,
    raw: Vec<u8>,
    hash: Bytes32,
}

fn scalar_item(bytes: &[u8; 32]) -> RlpItem {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    RlpItem::bytes(bytes[first..].to_vec())
}

fn scalar_from_item(item: &RlpItem, name: &str) -> Result<[u8; 32], ArbitrationError> {
    let bytes = item.as_bytes()?;
    if bytes.len() > 32 || bytes.first() == Some(&0) {
        return Err(ArbitrationError::InvalidTransaction(format!(
            "{name} is not a canonical 256-bit integer"
        )));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

impl SignedTransaction {
    /// Encode a transaction with its signature.
    pub fn from_parts(transaction: LegacyTransaction, signature: RecoverableSignature) -> Self {
        let mut items = transaction.base_items();
        items.push(RlpItem::uint(signature.eip155_v(transaction.chain_id)));
        items.push(scalar_item(signature.r()));
        items.push(scalar_item(signature.s()));
        let raw = RlpItem::List(items).encode();
        let hash = keccak256(&raw);
        Self {
            transaction,
            signature,
            raw,
            hash,
        }
    }

    /// Decode a raw EIP-155 legacy transaction.
    pub fn decode(raw: &[u8]) -> Result<Self, ArbitrationError> {
        let item = RlpItem::decode(raw)?;
        let fields = item.as_list()?;
        if fields.len() != 9 {
            return Err(ArbitrationError::InvalidTransaction(format!(
                "expected 9 fields, got {}",
                fields.len()
            )));
        }
        let to = Address::from_slice(fields[3].as_bytes()?).map_err(|e| {
            ArbitrationError::InvalidTransaction(format!("destination: {e}"))
        })?;
        let v = fields[6].as_uint()?;
        if v < 35 {
            return Err(ArbitrationError::InvalidTransaction(format!(
                "v = {v} is not EIP-155 protected"
            )));
        }
        let chain_id = u64::try_from((v - 35) / 2)
            .map_err(|_| ArbitrationError::InvalidTransaction("chain id overflows u64".into()))?;
        let recovery_id = ((v - 35) % 2) as u8;
        let signature = RecoverableSignature::new(
            scalar_from_item(&fields[7], "r")?,
            scalar_from_item(&fields[8], "s")?,
            recovery_id,
        )?;
        let transaction = LegacyTransaction {
            nonce: fields[0].as_u64()?,
            gas_price: fields[1].as_uint()?,
            gas_limit: fields[2].as_u64()?,
            to,
            value: fields[4].as_uint()?,
            data: fields[5].as_bytes()?.to_vec(),
            chain_id,
        };
        Ok(Self {
            transaction,
            signature,
            raw: raw.to_vec(),
            hash: keccak256(raw),
        })
    }

    /// Recover the sender from the signature and the signing hash.
    pub fn recover_sender(&self) -> Result<Address, ArbitrationError> {
        Ok(recover_address(
            &self.transaction.signing_hash(),
            &self.signature,
        )?)
    }

    /// The unsigned transaction.
    pub fn transaction(&self) -> &LegacyTransaction {
        &self.transaction
    }

    /// The signature.
    pub fn signature(&self) -> &RecoverableSignature {
        &self.signature
    }

    /// Raw RLP bytes for `eth_sendRawTransaction`.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// `0x`-prefixed hex of [`Self::raw`].
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    /// Transaction hash: keccak-256 of the raw bytes.
    pub fn hash(&self) -> Bytes32 {
        self.hash
    }
}
