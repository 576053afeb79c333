//! # tribunal-core -- Foundational Types for Tribunal
//!
//! The leaf of the workspace DAG. Everything that must agree byte-for-byte
//! with the on-chain verifier lives here:
//!
//! 1. **Newtype primitives.** [`Bytes32`] and [`Address`] instead of bare
//!    byte arrays or hex strings. Parsing is strict (exact length, hex only);
//!    display is `0x`-prefixed, and addresses render EIP-55 checksummed.
//!
//! 2. **Keccak-256.** [`keccak256`], [`function_selector`] and
//!    [`eth_signed_message_hash`] are the only hashing entry points used by
//!    the verdict and transaction paths.
//!
//! 3. **Binary codec.** [`abi`] implements the subset of the Solidity ABI
//!    needed for `submitVerdict` calldata and `getDispute`/`getEscrow`
//!    return data. [`rlp`] implements RLP for the legacy transaction shape.
//!    Neither is a general-purpose library.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tribunal-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod abi;
pub mod digest;
pub mod error;
pub mod primitives;
pub mod rlp;

pub use abi::{AbiDecoder, Token};
pub use digest::{eth_signed_message_hash, function_selector, keccak256};
pub use error::{CodecError, CryptoError, PrimitiveError};
pub use primitives::{Address, Bytes32};
pub use rlp::RlpItem;
