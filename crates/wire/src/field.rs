//! Fixed-width values, length-delimited values and whole-field skipping.

use crate::tag::{consume_tag, size_tag, Number, WireType};
use crate::varint::{append_varint, consume_varint, size_varint};
use crate::WireError;

/// Maximum group nesting accepted by [`consume_field_value`].
pub const DEFAULT_RECURSION_LIMIT: usize = 10_000;

pub fn append_fixed32(b: &mut Vec<u8>, v: u32) {
    b.extend_from_slice(&v.to_le_bytes());
}

pub fn append_fixed64(b: &mut Vec<u8>, v: u64) {
    b.extend_from_slice(&v.to_le_bytes());
}

pub fn consume_fixed32(b: &[u8]) -> Result<(u32, usize), WireError> {
    let bytes: [u8; 4] = b
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or(WireError::UnexpectedEof)?;
    Ok((u32::from_le_bytes(bytes), 4))
}

pub fn consume_fixed64(b: &[u8]) -> Result<(u64, usize), WireError> {
    let bytes: [u8; 8] = b
        .get(..8)
        .and_then(|s| s.try_into().ok())
        .ok_or(WireError::UnexpectedEof)?;
    Ok((u64::from_le_bytes(bytes), 8))
}

#[inline]
pub fn size_fixed32() -> usize {
    4
}

#[inline]
pub fn size_fixed64() -> usize {
    8
}

/// Appends `v` with a varint length prefix.
pub fn append_bytes(b: &mut Vec<u8>, v: &[u8]) {
    append_varint(b, v.len() as u64);
    b.extend_from_slice(v);
}

/// Parses a length-prefixed value and returns the payload without its prefix.
pub fn consume_bytes(b: &[u8]) -> Result<(&[u8], usize), WireError> {
    let (m, n) = consume_varint(b)?;
    let rest = &b[n..];
    if m > rest.len() as u64 {
        return Err(WireError::UnexpectedEof);
    }
    let m = m as usize;
    Ok((&rest[..m], n + m))
}

/// Returns the size of a length-prefixed value with an `n`-byte payload.
#[inline]
pub fn size_bytes(n: usize) -> usize {
    size_varint(n as u64) + n
}

/// Parses a group body for field `num`, including its end marker.
///
/// The returned slice excludes the end marker; the consumed count includes it.
pub fn consume_group(num: Number, b: &[u8]) -> Result<(&[u8], usize), WireError> {
    let n = consume_field_value(num, WireType::StartGroup, b)?;
    let mut body = &b[..n];
    // The end marker may be a denormalized varint; strip its padding first.
    while let Some((&last, head)) = body.split_last() {
        if last & 0x7f != 0 {
            break;
        }
        body = head;
    }
    let body = &body[..body.len().saturating_sub(size_tag(num))];
    Ok((body, n))
}

/// Returns the length of the value for a field whose tag was already consumed.
pub fn consume_field_value(num: Number, typ: WireType, b: &[u8]) -> Result<usize, WireError> {
    consume_field_value_depth(num, typ, b, DEFAULT_RECURSION_LIMIT)
}

fn consume_field_value_depth(
    num: Number,
    typ: WireType,
    b: &[u8],
    depth: usize,
) -> Result<usize, WireError> {
    match typ {
        WireType::Varint => consume_varint(b).map(|(_, n)| n),
        WireType::Fixed32 => consume_fixed32(b).map(|(_, n)| n),
        WireType::Fixed64 => consume_fixed64(b).map(|(_, n)| n),
        WireType::Bytes => consume_bytes(b).map(|(_, n)| n),
        WireType::StartGroup => {
            if depth == 0 {
                return Err(WireError::RecursionLimit);
            }
            let mut rest = b;
            loop {
                let (num2, typ2, n) = consume_tag(rest)?;
                rest = &rest[n..];
                if typ2 == WireType::EndGroup {
                    if num != num2 {
                        return Err(WireError::EndGroupMismatch);
                    }
                    return Ok(b.len() - rest.len());
                }
                let n = consume_field_value_depth(num2, typ2, rest, depth - 1)?;
                rest = &rest[n..];
            }
        }
        WireType::EndGroup => Err(WireError::EndGroupMismatch),
    }
}

/// Parses a complete field (tag and value) and returns its total length.
pub fn consume_field(b: &[u8]) -> Result<(Number, WireType, usize), WireError> {
    let (num, typ, n) = consume_tag(b)?;
    let m = consume_field_value(num, typ, &b[n..])?;
    Ok((num, typ, n + m))
}
