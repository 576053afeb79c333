//! # ABI Codec
//!
//! A minimal Solidity ABI encoder and a word-addressed decoder, covering
//! exactly the types that appear in the verifier and registry interfaces:
//! `uint<N>` (up to 128 significant bits), `bytes32`, `address`, `bool`,
//! `bytes`, `string`, tuples, and fixed-size arrays `T[k]`.
//!
//! ## Encoding Rules
//!
//! Every value occupies one or more 32-byte words. Static values are
//! encoded in place in the head; dynamic values (`bytes`, `string`, and any
//! tuple/array containing one) leave a byte offset in the head, measured
//! from the start of the enclosing tuple, and are appended to the tail.
//! A static tuple or fixed array is inlined into its parent's head.
//!
//! The verdict struct is fully static, so `abi.encode(verdict)` is a plain
//! concatenation of 19 words. The same [`Token`] tree is reused as the first
//! argument of `submitVerdict`, which is why the hashing path and the
//! calldata path cannot drift apart.

use crate::error::CodecError;
use crate::primitives::{Address, Bytes32};

/// ABI word size in bytes.
pub const WORD: usize = 32;

/// A value to be ABI-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Any `uintN` with N ≤ 128 significant bits; always one word.
    Uint(u128),
    /// `bytes32`.
    FixedBytes(Bytes32),
    /// `address`, left-padded to one word.
    Address(Address),
    /// `bool`, encoded as 0 or 1.
    Bool(bool),
    /// Dynamic `bytes`.
    Bytes(Vec<u8>),
    /// Dynamic `string` (UTF-8).
    String(String),
    /// Tuple / struct.
    Tuple(Vec<Token>),
    /// Fixed-size array `T[k]`; `k` is the vector length.
    FixedArray(Vec<Token>),
}

impl Token {
    /// Whether this value is dynamic in the ABI sense.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Token::Bytes(_) | Token::String(_) => true,
            Token::Tuple(items) | Token::FixedArray(items) => items.iter().any(Token::is_dynamic),
            Token::Uint(_) | Token::FixedBytes(_) | Token::Address(_) | Token::Bool(_) => false,
        }
    }

    /// Number of bytes this value occupies in its parent's head.
    fn head_len(&self) -> usize {
        if self.is_dynamic() {
            return WORD;
        }
        match self {
            Token::Tuple(items) | Token::FixedArray(items) => {
                items.iter().map(Token::head_len).sum()
            }
            _ => WORD,
        }
    }

    /// Append the in-place encoding of this value (for static values this is
    /// the head; for dynamic values it is the tail body).
    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Token::Uint(v) => out.extend_from_slice(&uint_word(*v)),
            Token::FixedBytes(b) => out.extend_from_slice(b.as_bytes()),
            Token::Address(a) => out.extend_from_slice(&address_word(a)),
            Token::Bool(b) => out.extend_from_slice(&uint_word(u128::from(*b))),
            Token::Bytes(bytes) => encode_dynamic_bytes(bytes, out),
            Token::String(s) => encode_dynamic_bytes(s.as_bytes(), out),
            Token::Tuple(items) | Token::FixedArray(items) => encode_sequence(items, out),
        }
    }
}

/// Left-pad an unsigned integer into a 32-byte big-endian word.
pub fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn encode_dynamic_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&uint_word(bytes.len() as u128));
    out.extend_from_slice(bytes);
    let rem = bytes.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + (WORD - rem), 0);
    }
}

fn encode_sequence(tokens: &[Token], out: &mut Vec<u8>) {
    let head_len: usize = tokens.iter().map(Token::head_len).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            token.encode_into(&mut tail);
        } else {
            token.encode_into(&mut head);
        }
    }
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
}

/// `abi.encode(tokens...)`.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_sequence(tokens, &mut out);
    out
}

/// Function calldata: `selector || abi.encode(args...)`.
pub fn encode_call(selector: [u8; 4], args: &[Token]) -> Vec<u8> {
    let mut out = selector.to_vec();
    encode_sequence(args, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Word-addressed reader over ABI-encoded return data.
///
/// All offsets are byte offsets relative to the start of this decoder's
/// view. Use [`AbiDecoder::at`] to descend into a dynamic tuple, whose
/// internal offsets are relative to its own start.
#[derive(Debug, Clone, Copy)]
pub struct AbiDecoder<'a> {
    data: &'a [u8],
    base: usize,
}

impl<'a> AbiDecoder<'a> {
    /// Wrap return data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, base: 0 }
    }

    /// A decoder whose offset 0 is `offset` in this view.
    pub fn at(&self, offset: usize) -> Result<AbiDecoder<'a>, CodecError> {
        if offset > self.data.len() {
            return Err(CodecError::UnexpectedEnd {
                offset: self.base + offset,
                needed: offset - self.data.len(),
            });
        }
        Ok(AbiDecoder {
            data: &self.data[offset..],
            base: self.base + offset,
        })
    }

    /// Total length of the view in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], CodecError> {
        let end = offset.checked_add(len).ok_or(CodecError::Invalid {
            offset: self.base + offset,
            reason: "offset overflow".into(),
        })?;
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEnd {
                offset: self.base + offset,
                needed: end - self.data.len(),
            });
        }
        Ok(&self.data[offset..end])
    }

    /// The raw 32-byte word at `offset`.
    pub fn word(&self, offset: usize) -> Result<&'a [u8], CodecError> {
        self.slice(offset, WORD)
    }

    fn narrow(&self, offset: usize, width: usize, target: &'static str) -> Result<&'a [u8], CodecError> {
        let word = self.word(offset)?;
        if word[..WORD - width].iter().any(|b| *b != 0) {
            return Err(CodecError::Overflow {
                offset: self.base + offset,
                target,
            });
        }
        Ok(&word[WORD - width..])
    }

    /// `bytes32` at `offset`.
    pub fn bytes32(&self, offset: usize) -> Result<Bytes32, CodecError> {
        let word = self.word(offset)?;
        let mut out = [0u8; WORD];
        out.copy_from_slice(word);
        Ok(Bytes32(out))
    }

    /// `uint256` at `offset`, which must fit in 128 bits.
    pub fn uint(&self, offset: usize) -> Result<u128, CodecError> {
        let tail = self.narrow(offset, 16, "u128")?;
        let mut buf = [0u8; 16];
        buf.copy_from_slice(tail);
        Ok(u128::from_be_bytes(buf))
    }

    /// `uint` at `offset`, which must fit in 64 bits.
    pub fn uint_u64(&self, offset: usize) -> Result<u64, CodecError> {
        let tail = self.narrow(offset, 8, "u64")?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(tail);
        Ok(u64::from_be_bytes(buf))
    }

    /// `uint16` at `offset`.
    pub fn uint_u16(&self, offset: usize) -> Result<u16, CodecError> {
        let tail = self.narrow(offset, 2, "u16")?;
        Ok(u16::from_be_bytes([tail[0], tail[1]]))
    }

    /// `uint8` (or a Solidity enum) at `offset`.
    pub fn uint_u8(&self, offset: usize) -> Result<u8, CodecError> {
        Ok(self.narrow(offset, 1, "u8")?[0])
    }

    /// `address` at `offset`; the 12 padding bytes must be zero.
    pub fn address(&self, offset: usize) -> Result<Address, CodecError> {
        let tail = self.narrow(offset, 20, "address")?;
        let mut out = [0u8; 20];
        out.copy_from_slice(tail);
        Ok(Address(out))
    }

    /// `bool` at `offset`; only 0 and 1 are accepted.
    pub fn bool(&self, offset: usize) -> Result<bool, CodecError> {
        match self.uint_u8(offset) {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            Ok(other) => Err(CodecError::Invalid {
                offset: self.base + offset,
                reason: format!("bool word holds {other}"),
            }),
            Err(_) => Err(CodecError::Invalid {
                offset: self.base + offset,
                reason: "bool word has non-zero high bytes".into(),
            }),
        }
    }

    /// Follow the head pointer at `offset` to a tail position.
    pub fn pointer(&self, offset: usize) -> Result<usize, CodecError> {
        let value = self.uint_u64(offset)?;
        usize::try_from(value).map_err(|_| CodecError::Overflow {
            offset: self.base + offset,
            target: "usize",
        })
    }

    /// Dynamic `bytes` whose head pointer sits at `offset`.
    pub fn dynamic_bytes(&self, offset: usize) -> Result<Vec<u8>, CodecError> {
        let start = self.pointer(offset)?;
        let len = usize::try_from(self.uint_u64(start)?).map_err(|_| CodecError::Overflow {
            offset: self.base + start,
            target: "usize",
        })?;
        Ok(self.slice(start + WORD, len)?.to_vec())
    }

    /// Dynamic `string` whose head pointer sits at `offset`.
    pub fn string(&self, offset: usize) -> Result<String, CodecError> {
        let bytes = self.dynamic_bytes(offset)?;
        String::from_utf8(bytes).map_err(|e| CodecError::Invalid {
            offset: self.base + offset,
            reason: format!("string is not UTF-8: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word_hex(value: u128) -> String {
        hex::encode(uint_word(value))
    }

    #[test]
    fn uint_is_left_padded() {
        let enc = encode(&[Token::Uint(0x0123)]);
        assert_eq!(enc.len(), 32);
        assert_eq!(hex::encode(&enc), format!("{}0123", "0".repeat(60)));
    }

    #[test]
    fn address_is_left_padded() {
        let addr = Address([0xaa; 20]);
        let enc = encode(&[Token::Address(addr)]);
        assert_eq!(&enc[..12], &[0u8; 12]);
        assert_eq!(&enc[12..], &[0xaa; 20]);
        assert_eq!(AbiDecoder::new(&enc).address(0).unwrap(), addr);
    }

    #[test]
    fn static_then_string_uses_head_offset() {
        // f(uint256 0x123, string "Hello, world!")
        let enc = encode(&[
            Token::Uint(0x123),
            Token::String("Hello, world!".into()),
        ]);
        let expected = [
            word_hex(0x123),
            word_hex(0x40),
            word_hex(13),
            format!("{}{}", hex::encode("Hello, world!"), "0".repeat(38)),
        ]
        .concat();
        assert_eq!(hex::encode(&enc), expected);

        let dec = AbiDecoder::new(&enc);
        assert_eq!(dec.uint(0).unwrap(), 0x123);
        assert_eq!(dec.string(32).unwrap(), "Hello, world!");
    }

    #[test]
    fn empty_bytes_is_just_a_length_word() {
        let enc = encode(&[Token::Bytes(vec![])]);
        assert_eq!(enc.len(), 64);
        assert_eq!(AbiDecoder::new(&enc).dynamic_bytes(0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn word_aligned_bytes_get_no_padding() {
        let enc = encode(&[Token::Bytes(vec![7u8; 64])]);
        assert_eq!(enc.len(), 32 + 32 + 64);
    }

    #[test]
    fn static_struct_array_is_inlined() {
        // (bytes32,uint8,uint16,bytes32)[3] is static: 12 words, no offsets.
        let member = |n: u8| {
            Token::Tuple(vec![
                Token::FixedBytes(Bytes32([n; 32])),
                Token::Uint(u128::from(n)),
                Token::Uint(u128::from(n) * 1000),
                Token::FixedBytes(Bytes32([n + 100; 32])),
            ])
        };
        let array = Token::FixedArray(vec![member(1), member(2), member(3)]);
        assert!(!array.is_dynamic());
        let enc = encode(&[array]);
        assert_eq!(enc.len(), 12 * WORD);

        let dec = AbiDecoder::new(&enc);
        for (i, n) in [1u8, 2, 3].iter().enumerate() {
            let base = i * 4 * WORD;
            assert_eq!(dec.bytes32(base).unwrap(), Bytes32([*n; 32]));
            assert_eq!(dec.uint_u8(base + WORD).unwrap(), *n);
            assert_eq!(dec.uint_u16(base + 2 * WORD).unwrap(), u16::from(*n) * 1000);
            assert_eq!(dec.bytes32(base + 3 * WORD).unwrap(), Bytes32([*n + 100; 32]));
        }
    }

    #[test]
    fn dynamic_tuple_is_referenced_by_offset() {
        let tuple = Token::Tuple(vec![Token::Uint(9), Token::String("x".into())]);
        assert!(tuple.is_dynamic());
        let enc = encode(&[tuple]);
        let dec = AbiDecoder::new(&enc);
        let inner = dec.at(dec.pointer(0).unwrap()).unwrap();
        assert_eq!(inner.uint(0).unwrap(), 9);
        assert_eq!(inner.string(WORD).unwrap(), "x");
    }

    #[test]
    fn static_tuple_followed_by_bytes() {
        let enc = encode(&[
            Token::Tuple(vec![Token::Uint(1), Token::Uint(2)]),
            Token::Bytes(vec![0xde, 0xad]),
        ]);
        let dec = AbiDecoder::new(&enc);
        // Head: two inlined words + one offset word.
        assert_eq!(dec.pointer(2 * WORD).unwrap(), 3 * WORD);
        assert_eq!(dec.dynamic_bytes(2 * WORD).unwrap(), vec![0xde, 0xad]);
    }

    #[test]
    fn encode_call_prefixes_selector() {
        let call = encode_call([1, 2, 3, 4], &[Token::Bool(true)]);
        assert_eq!(&call[..4], &[1, 2, 3, 4]);
        assert_eq!(call.len(), 4 + WORD);
        assert!(AbiDecoder::new(&call[4..]).bool(0).unwrap());
    }

    #[test]
    fn bool_rejects_values_above_one() {
        let enc = encode(&[Token::Uint(2)]);
        assert!(matches!(
            AbiDecoder::new(&enc).bool(0),
            Err(CodecError::Invalid { .. })
        ));
    }

    #[test]
    fn narrow_decode_rejects_overflow() {
        let enc = encode(&[Token::Uint(300)]);
        let dec = AbiDecoder::new(&enc);
        assert!(matches!(dec.uint_u8(0), Err(CodecError::Overflow { .. })));
        assert_eq!(dec.uint_u16(0).unwrap(), 300);
    }

    #[test]
    fn address_rejects_dirty_padding() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(AbiDecoder::new(&word).address(0).is_err());
    }

    #[test]
    fn truncated_input_reports_offset() {
        let dec = AbiDecoder::new(&[0u8; 40]);
        assert_eq!(
            dec.word(32).unwrap_err(),
            CodecError::UnexpectedEnd {
                offset: 32,
                needed: 24
            }
        );
    }

    #[test]
    fn string_length_beyond_data_is_rejected() {
        let mut enc = encode(&[Token::String("abc".into())]);
        // Corrupt the length word to claim 1000 bytes.
        enc[32..64].copy_from_slice(&uint_word(1000));
        assert!(matches!(
            AbiDecoder::new(&enc).string(0),
            Err(CodecError::UnexpectedEnd { .. })
        ));
    }

    proptest! {
        #[test]
        fn uint_roundtrip(value in any::<u128>()) {
            let enc = encode(&[Token::Uint(value)]);
            prop_assert_eq!(AbiDecoder::new(&enc).uint(0).unwrap(), value);
        }

        #[test]
        fn bytes32_roundtrip(raw in any::<[u8; 32]>()) {
            let enc = encode(&[Token::FixedBytes(Bytes32(raw))]);
            prop_assert_eq!(AbiDecoder::new(&enc).bytes32(0).unwrap(), Bytes32(raw));
        }

        #[test]
        fn string_roundtrip(s in "\\PC{0,120}") {
            let enc = encode(&[Token::Uint(1), Token::String(s.clone())]);
            prop_assert_eq!(enc.len() % WORD, 0);
            prop_assert_eq!(AbiDecoder::new(&enc).string(WORD).unwrap(), s);
        }

        #[test]
        fn bytes_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
            let enc = encode(&[Token::Bytes(bytes.clone())]);
            prop_assert_eq!(AbiDecoder::new(&enc).dynamic_bytes(0).unwrap(), bytes);
        }
    }
}
