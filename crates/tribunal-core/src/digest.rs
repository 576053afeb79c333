//! # Keccak-256 Digests
//!
//! The verifier contract hashes with `keccak256`, so every digest that is
//! committed on-chain (verdict hash, reasoning hashes, model-id hashes,
//! evidence commitments, function selectors, transaction hashes) goes
//! through [`keccak256`]. This is the original Keccak padding, not the
//! NIST SHA3-256 variant.

use sha3::{Digest, Keccak256};

use crate::primitives::Bytes32;

/// Prefix applied by `eth_sign` / `personal_sign` to a 32-byte message.
pub const ETH_SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Compute the keccak-256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> Bytes32 {
    let hash = Keccak256::digest(data.as_ref());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Bytes32(out)
}

/// First four bytes of the keccak-256 of a canonical function signature,
/// e.g. `"getDispute(bytes32)"`.
///
/// The signature must be canonical: no spaces, no parameter names, tuple
/// types spelled out in parentheses.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash.0[0], hash.0[1], hash.0[2], hash.0[3]]
}

/// Wrap a 32-byte digest in the fixed-length "Ethereum Signed Message"
/// envelope and hash again.
///
/// This is the digest an on-chain `ECDSA.toEthSignedMessageHash(bytes32)`
/// recomputes before `ecrecover`.
pub fn eth_signed_message_hash(digest: &Bytes32) -> Bytes32 {
    let mut hasher = Keccak256::new();
    hasher.update(ETH_SIGNED_MESSAGE_PREFIX);
    hasher.update(digest.as_bytes());
    let hash = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Bytes32(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_empty_input() {
        assert_eq!(
            keccak256(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn keccak_abc_is_not_sha3() {
        // SHA3-256("abc") starts with 3a985da7; Keccak-256 differs.
        assert_eq!(
            keccak256(b"abc").to_hex(),
            "0x4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn erc20_transfer_selector() {
        assert_eq!(
            function_selector("transfer(address,uint256)"),
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn signed_message_hash_matches_manual_concatenation() {
        let digest = keccak256(b"verdict");
        let mut buf = ETH_SIGNED_MESSAGE_PREFIX.to_vec();
        buf.extend_from_slice(digest.as_bytes());
        assert_eq!(eth_signed_message_hash(&digest), keccak256(&buf));
    }

    #[test]
    fn prefix_is_28_bytes() {
        assert_eq!(ETH_SIGNED_MESSAGE_PREFIX.len(), 28);
    }
}
