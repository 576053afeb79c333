//! # secp256k1 Recoverable Signatures
//!
//! Signs 32-byte prehashed digests with the operator key and recovers the
//! signer's address from a signature. The digest handed to
//! [`sign_prehash`] is already the final value that `ecrecover` will see
//! (for verdicts, the "Ethereum Signed Message" hash; for transactions, the
//! EIP-155 signing hash). No further hashing happens here.
//!
//! ## Security Invariant
//!
//! Signatures are low-S normalized (k256 enforces this for secp256k1) so a
//! verifier that rejects high-S values (OpenZeppelin `ECDSA.recover`) always
//! accepts them. The recovery id is adjusted together with S.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Serialize, Serializer};

use tribunal_core::{keccak256, Address, Bytes32, CryptoError};

/// Offset added to the recovery id in the 65-byte `r || s || v` encoding.
pub const ETH_V_OFFSET: u8 = 27;

/// A secp256k1 signature with its recovery id.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    r: [u8; 32],
    s: [u8; 32],
    recovery_id: u8,
}

impl RecoverableSignature {
    /// Assemble from parts. `recovery_id` must be 0 or 1.
    pub fn new(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Result<Self, CryptoError> {
        if recovery_id > 1 {
            return Err(CryptoError::Signature(format!(
                "recovery id must be 0 or 1, got {recovery_id}"
            )));
        }
        Ok(Self { r, s, recovery_id })
    }

    /// The `r` scalar, big-endian.
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// The `s` scalar, big-endian.
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Raw recovery id (0 or 1).
    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    /// The `v` byte of the 65-byte encoding: 27 or 28.
    pub fn v(&self) -> u8 {
        self.recovery_id + ETH_V_OFFSET
    }

    /// EIP-155 `v`: `recovery_id + 35 + 2 * chain_id`.
    pub fn eip155_v(&self, chain_id: u64) -> u128 {
        u128::from(self.recovery_id) + 35 + 2 * u128::from(chain_id)
    }

    /// `r (32) || s (32) || v (1)` with v ∈ {27, 28}.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v();
        out
    }

    /// Parse the 65-byte encoding. Accepts v as 27/28 or as a raw 0/1.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 65 {
            return Err(CryptoError::Signature(format!(
                "signature must be 65 bytes, got {}",
                bytes.len()
            )));
        }
        let v = bytes[64];
        let recovery_id = if v >= ETH_V_OFFSET { v - ETH_V_OFFSET } else { v };
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self::new(r, s, recovery_id)
    }

    /// `0x`-prefixed lowercase hex of [`Self::to_bytes`].
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    fn to_k256(self) -> Result<(Signature, RecoveryId), CryptoError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let sig = Signature::from_slice(&rs)
            .map_err(|e| CryptoError::Signature(format!("invalid r/s: {e}")))?;
        let recid = RecoveryId::from_byte(self.recovery_id).ok_or_else(|| {
            CryptoError::Signature(format!("invalid recovery id {}", self.recovery_id))
        })?;
        Ok((sig, recid))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Sign a 32-byte prehashed digest with RFC-6979 nonces.
pub fn sign_prehash(key: &SigningKey, digest: &Bytes32) -> Result<RecoverableSignature, CryptoError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| CryptoError::Signature(format!("signing failed: {e}")))?;
    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    RecoverableSignature::new(r, s, recid.to_byte())
}

/// Ethereum address of a public key: last 20 bytes of
/// `keccak256(uncompressed_point[1..])`.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash.as_bytes()[12..]);
    Address(out)
}

/// Recover the signer's address from a prehashed digest and signature.
pub fn recover_address(digest: &Bytes32, signature: &RecoverableSignature) -> Result<Address, CryptoError> {
    let (sig, recid) = signature.to_k256()?;
    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recid)
        .map_err(|e| CryptoError::Signature(format!("public key recovery failed: {e}")))?;
    Ok(address_from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    // secp256k1 group order n / 2, big-endian.
    const HALF_ORDER: [u8; 32] = [
        0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b,
        0x20, 0xa0,
    ];

    fn key_from_hex(hex_key: &str) -> SigningKey {
        SigningKey::from_slice(&hex::decode(hex_key).unwrap()).unwrap()
    }

    #[test]
    fn known_key_derives_known_address() {
        let key = key_from_hex("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318");
        assert_eq!(
            address_from_verifying_key(key.verifying_key()).to_checksum(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
    }

    #[test]
    fn hardhat_account_zero() {
        let key = key_from_hex("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
        assert_eq!(
            address_from_verifying_key(key.verifying_key()).to_checksum(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn sign_then_recover_yields_signer() {
        let key = key_from_hex("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318");
        let digest = keccak256(b"verdict digest");
        let sig = sign_prehash(&key, &digest).unwrap();
        assert_eq!(
            recover_address(&digest, &sig).unwrap(),
            address_from_verifying_key(key.verifying_key())
        );
    }

    #[test]
    fn signatures_are_deterministic_and_low_s() {
        let key = key_from_hex("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
        for i in 0u8..16 {
            let digest = keccak256([i]);
            let a = sign_prehash(&key, &digest).unwrap();
            let b = sign_prehash(&key, &digest).unwrap();
            assert_eq!(a, b);
            assert!(a.s() <= &HALF_ORDER, "high-S signature for input {i}");
            assert!(a.v() == 27 || a.v() == 28);
        }
    }

    #[test]
    fn recovery_under_wrong_digest_gives_other_address() {
        let key = key_from_hex("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
        let sig = sign_prehash(&key, &keccak256(b"one")).unwrap();
        let other = recover_address(&keccak256(b"two"), &sig);
        assert_ne!(other.ok(), Some(address_from_verifying_key(key.verifying_key())));
    }

    #[test]
    fn bytes_roundtrip_accepts_both_v_conventions() {
        let key = key_from_hex("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
        let sig = sign_prehash(&key, &keccak256(b"x")).unwrap();
        let mut bytes = sig.to_bytes();
        assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), sig);
        bytes[64] -= 27;
        assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), sig);
    }

    #[test]
    fn from_bytes_rejects_bad_length_and_v() {
        assert!(RecoverableSignature::from_bytes(&[0u8; 64]).is_err());
        let mut bytes = [1u8; 65];
        bytes[64] = 30;
        assert!(RecoverableSignature::from_bytes(&bytes).is_err());
    }

    #[test]
    fn eip155_v_formula() {
        let sig = RecoverableSignature::new([1; 32], [2; 32], 0).unwrap();
        assert_eq!(sig.eip155_v(1), 37);
        let sig = RecoverableSignature::new([1; 32], [2; 32], 1).unwrap();
        assert_eq!(sig.eip155_v(11_155_111), 22_310_258);
    }

    #[test]
    fn serializes_as_hex_string() {
        let sig = RecoverableSignature::new([0xaa; 32], [0xbb; 32], 1).unwrap();
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, format!("\"0x{}{}1c\"", "aa".repeat(32), "bb".repeat(32)));
    }
}
