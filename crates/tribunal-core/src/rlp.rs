//! # RLP
//!
//! Recursive Length Prefix encoding for the legacy transaction envelope.
//! An item is either a byte string or a list of items. Integers are encoded
//! as big-endian byte strings with no leading zeros (zero is the empty
//! string).
//!
//! Decoding is strict: non-canonical length prefixes, single bytes below
//! `0x80` wrapped in a string header, and trailing bytes are all rejected.
//! A raw transaction that decodes here re-encodes to exactly the same bytes.

use crate::error::CodecError;

/// An RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// A byte string.
    Bytes(Vec<u8>),
    /// A list of items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Canonical integer encoding: big-endian, no leading zeros.
    pub fn uint(value: u128) -> Self {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        RlpItem::Bytes(bytes[first..].to_vec())
    }

    /// Byte string item.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(bytes.into())
    }

    /// Serialize to RLP.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RlpItem::Bytes(bytes) => {
                if bytes.len() == 1 && bytes[0] < 0x80 {
                    out.push(bytes[0]);
                } else {
                    write_header(out, 0x80, bytes.len());
                    out.extend_from_slice(bytes);
                }
            }
            RlpItem::List(items) => {
                let mut payload = Vec::new();
                for item in items {
                    item.encode_into(&mut payload);
                }
                write_header(out, 0xc0, payload.len());
                out.extend_from_slice(&payload);
            }
        }
    }

    /// Decode exactly one item spanning all of `data`.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let (item, consumed) = decode_at(data, 0)?;
        if consumed != data.len() {
            return Err(CodecError::Invalid {
                offset: consumed,
                reason: format!("{} trailing bytes after RLP item", data.len() - consumed),
            });
        }
        Ok(item)
    }

    /// Borrow as a byte string.
    pub fn as_bytes(&self) -> Result<&[u8], CodecError> {
        match self {
            RlpItem::Bytes(b) => Ok(b),
            RlpItem::List(_) => Err(CodecError::UnexpectedShape {
                expected: "byte string".into(),
            }),
        }
    }

    /// Borrow as a list.
    pub fn as_list(&self) -> Result<&[RlpItem], CodecError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(CodecError::UnexpectedShape {
                expected: "list".into(),
            }),
        }
    }

    /// Interpret as a canonical unsigned integer of at most 128 bits.
    pub fn as_uint(&self) -> Result<u128, CodecError> {
        let bytes = self.as_bytes()?;
        if bytes.first() == Some(&0) {
            return Err(CodecError::Invalid {
                offset: 0,
                reason: "integer has leading zero byte".into(),
            });
        }
        if bytes.len() > 16 {
            return Err(CodecError::Overflow {
                offset: 0,
                target: "u128",
            });
        }
        Ok(bytes.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
    }

    /// Interpret as a canonical unsigned integer of at most 64 bits.
    pub fn as_u64(&self) -> Result<u64, CodecError> {
        u64::try_from(self.as_uint()?).map_err(|_| CodecError::Overflow {
            offset: 0,
            target: "u64",
        })
    }
}

fn write_header(out: &mut Vec<u8>, base: u8, len: usize) {
    if len <= 55 {
        out.push(base + len as u8);
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let first = len_bytes.iter().position(|b| *b != 0).unwrap_or(len_bytes.len() - 1);
        let len_bytes = &len_bytes[first..];
        out.push(base + 55 + len_bytes.len() as u8);
        out.extend_from_slice(len_bytes);
    }
}

fn need(data: &[u8], offset: usize, len: usize) -> Result<(), CodecError> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(()),
        Some(end) => Err(CodecError::UnexpectedEnd {
            offset,
            needed: end - data.len(),
        }),
        None => Err(CodecError::Invalid {
            offset,
            reason: "length overflows usize".into(),
        }),
    }
}

/// Read a long-form length of `len_of_len` bytes starting at `offset`.
fn read_long_len(data: &[u8], offset: usize, len_of_len: usize) -> Result<usize, CodecError> {
    need(data, offset, len_of_len)?;
    let bytes = &data[offset..offset + len_of_len];
    if bytes[0] == 0 {
        return Err(CodecError::Invalid {
            offset,
            reason: "length prefix has leading zero".into(),
        });
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(CodecError::Overflow {
            offset,
            target: "usize",
        });
    }
    let len = bytes.iter().fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    if len <= 55 {
        return Err(CodecError::Invalid {
            offset,
            reason: format!("long-form length {len} must exceed 55"),
        });
    }
    Ok(len)
}

/// Decode one item at `offset`; returns the item and the offset just past it.
fn decode_at(data: &[u8], offset: usize) -> Result<(RlpItem, usize), CodecError> {
    need(data, offset, 1)?;
    let prefix = data[offset];
    match prefix {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![prefix]), offset + 1)),
        0x80..=0xb7 => {
            let len = usize::from(prefix - 0x80);
            let start = offset + 1;
            need(data, start, len)?;
            if len == 1 && data[start] < 0x80 {
                return Err(CodecError::Invalid {
                    offset,
                    reason: "single byte below 0x80 must not carry a header".into(),
                });
            }
            Ok((RlpItem::Bytes(data[start..start + len].to_vec()), start + len))
        }
        0xb8..=0xbf => {
            let len_of_len = usize::from(prefix - 0xb7);
            let len = read_long_len(data, offset + 1, len_of_len)?;
            let start = offset + 1 + len_of_len;
            need(data, start, len)?;
            Ok((RlpItem::Bytes(data[start..start + len].to_vec()), start + len))
        }
        0xc0..=0xf7 => {
            let len = usize::from(prefix - 0xc0);
            decode_list(data, offset + 1, len)
        }
        0xf8..=0xff => {
            let len_of_len = usize::from(prefix - 0xf7);
            let len = read_long_len(data, offset + 1, len_of_len)?;
            decode_list(data, offset + 1 + len_of_len, len)
        }
    }
}

fn decode_list(data: &[u8], start: usize, len: usize) -> Result<(RlpItem, usize), CodecError> {
    need(data, start, len)?;
    let end = start + len;
    let payload = &data[..end];
    let mut items = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let (item, next) = decode_at(payload, cursor)?;
        items.push(item);
        cursor = next;
    }
    Ok((RlpItem::List(items), end))
}
