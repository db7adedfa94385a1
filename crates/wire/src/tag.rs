//! Field numbers, wire types and tags.

use std::fmt;

use crate::varint::{append_varint, consume_varint, size_varint};
use crate::WireError;

/// A field number.
///
/// Field numbers are signed 32-bit on the API surface but only
/// `1..=2^29-1` can appear in a well-formed tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Number(pub i32);

impl Number {
    pub const MIN: Number = Number(1);
    pub const MAX: Number = Number((1 << 29) - 1);
    pub const FIRST_RESERVED: Number = Number(19000);
    pub const LAST_RESERVED: Number = Number(19999);

    /// Reports whether the number may be declared in a schema.
    pub fn is_valid(self) -> bool {
        Self::MIN <= self && self <= Self::MAX && !self.is_reserved()
    }

    /// Reports whether the number lies in the implementation-reserved range.
    pub fn is_reserved(self) -> bool {
        Self::FIRST_RESERVED <= self && self <= Self::LAST_RESERVED
    }

    #[inline]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number(v)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The low three bits of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Bytes = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    pub fn from_u8(v: u8) -> Result<Self, WireError> {
        match v {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Bytes),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(WireError::InvalidWireType(other)),
        }
    }
}

/// Combines a field number and wire type into a tag value.
#[inline]
pub fn encode_tag(num: Number, typ: WireType) -> u64 {
    ((num.0 as u64) << 3) | (typ as u64 & 7)
}

/// Splits a tag value into its field number and wire type.
pub fn decode_tag(x: u64) -> Result<(Number, WireType), WireError> {
    if x >> 3 > i32::MAX as u64 {
        return Err(WireError::InvalidFieldNumber);
    }
    let typ = WireType::from_u8((x & 7) as u8)?;
    Ok((Number((x >> 3) as i32), typ))
}

pub fn append_tag(b: &mut Vec<u8>, num: Number, typ: WireType) {
    append_varint(b, encode_tag(num, typ));
}

/// Parses a tag from the front of `b`, rejecting field number zero.
pub fn consume_tag(b: &[u8]) -> Result<(Number, WireType, usize), WireError> {
    let (v, n) = consume_varint(b)?;
    let (num, typ) = decode_tag(v)?;
    if num < Number::MIN {
        return Err(WireError::InvalidFieldNumber);
    }
    Ok((num, typ, n))
}

/// Returns the encoded size of a tag for `num`. The wire type never affects it.
#[inline]
pub fn size_tag(num: Number) -> usize {
    size_varint(encode_tag(num, WireType::Varint))
}
