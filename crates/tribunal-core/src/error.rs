//! # Error Types
//!
//! Structured errors for the core primitives. All errors use `thiserror`.
//! Decode errors carry the byte offset at which decoding failed so that a
//! malformed `eth_call` answer or raw transaction can be diagnosed from the
//! message alone.

use thiserror::Error;

/// Error while parsing a fixed-width primitive from text or bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Input was not valid hexadecimal.
    #[error("invalid hex for {kind}: {reason}")]
    InvalidHex {
        /// The primitive being parsed (e.g. "bytes32", "address").
        kind: &'static str,
        /// Description of the hex decoding failure.
        reason: String,
    },

    /// Input decoded to the wrong number of bytes.
    #[error("{kind} must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// The primitive being parsed.
        kind: &'static str,
        /// Required length in bytes.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
}

/// Error in ABI or RLP decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the item at `offset` was complete.
    #[error("unexpected end of input at offset {offset}: need {needed} more bytes")]
    UnexpectedEnd {
        /// Offset where the truncated item starts.
        offset: usize,
        /// Number of bytes missing.
        needed: usize,
    },

    /// A 32-byte ABI word does not fit the requested Rust integer width.
    #[error("ABI word at offset {offset} overflows {target}")]
    Overflow {
        /// Offset of the offending word.
        offset: usize,
        /// The Rust type the word was decoded into.
        target: &'static str,
    },

    /// A value violated the encoding rules (non-canonical RLP, dirty
    /// padding, bad boolean, invalid UTF-8, trailing bytes).
    #[error("invalid encoding at offset {offset}: {reason}")]
    Invalid {
        /// Offset of the offending item.
        offset: usize,
        /// What rule was broken.
        reason: String,
    },

    /// An RLP item had a different shape than the caller expected.
    #[error("unexpected RLP shape: expected {expected}")]
    UnexpectedShape {
        /// The expected shape ("list", "byte string", "9-item list", ...).
        expected: String,
    },
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature parsing, recovery, or verification failed.
    #[error("signature error: {0}")]
    Signature(String),

    /// Key generation, loading, or parsing failed.
    #[error("key error: {0}")]
    Key(String),

    /// The signing backend could not be reached or is not configured.
    #[error("key provider unavailable: {0}")]
    ProviderUnavailable(String),
}
