//! # tribunal-crypto -- Operator Signing
//!
//! Provides the secp256k1 building blocks for Tribunal:
//!
//! - **Recoverable ECDSA** over 32-byte prehashed digests, with RFC-6979
//!   deterministic nonces and low-S normalization, encoded `r || s || v`.
//! - **Public-key recovery** and **address derivation** (last 20 bytes of
//!   the keccak-256 of the uncompressed public key).
//! - **Key providers** that hold the operator key in zeroizing memory and
//!   expose only signing and the derived address.
//!
//! ## Crate Policy
//!
//! - Depends only on `tribunal-core` internally.
//! - No mocking of cryptographic operations in tests. All tests use real
//!   keccak-256 and real secp256k1.
//! - Key material never reaches `Debug`, `Display`, or `tracing` output.

pub mod key_provider;
pub mod secp256k1;

pub use key_provider::{EnvKeyProvider, KeyProvider, LocalKeyProvider};
pub use secp256k1::{address_from_verifying_key, recover_address, sign_prehash, RecoverableSignature};
pub use tribunal_core::CryptoError;
