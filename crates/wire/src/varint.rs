//! Base-128 varints and zig-zag mapping.

use crate::WireError;

/// Appends `v` as a base-128 varint.
///
/// # Example
///
/// ```
/// use protopack_wire::append_varint;
///
/// let mut b = Vec::new();
/// append_varint(&mut b, 300);
/// assert_eq!(b, [0xac, 0x02]);
/// ```
pub fn append_varint(b: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        b.push((v as u8) | 0x80);
        v >>= 7;
    }
    b.push(v as u8);
}

/// Parses a varint from the front of `b`.
///
/// The tenth byte may only carry the single remaining bit of a `u64`;
/// anything larger is reported as [`WireError::VarintOverflow`].
pub fn consume_varint(b: &[u8]) -> Result<(u64, usize), WireError> {
    let mut v: u64 = 0;
    for (i, &byte) in b.iter().take(10).enumerate() {
        if i == 9 && byte > 1 {
            return Err(WireError::VarintOverflow);
        }
        v |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            return Ok((v, i + 1));
        }
    }
    Err(WireError::UnexpectedEof)
}

/// Returns the encoded size of `v` as a varint.
#[inline]
pub fn size_varint(v: u64) -> usize {
    let bits = 64 - (v | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Maps a signed integer onto an unsigned one so that small magnitudes stay small.
#[inline]
pub fn encode_zig_zag(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

/// Inverse of [`encode_zig_zag`].
#[inline]
pub fn decode_zig_zag(x: u64) -> i64 {
    ((x >> 1) as i64) ^ (((x as i64) << 63) >> 63)
}
