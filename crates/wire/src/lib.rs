//! Wire-format primitives for protopack.
//!
//! This crate implements the low-level building blocks of the tagged binary
//! encoding: field tags, base-128 varints, fixed-width little-endian values,
//! length-delimited values and field skipping.
//!
//! # Overview
//!
//! - `append_*` functions write onto the end of a `Vec<u8>`
//! - `consume_*` functions parse from the front of a byte slice and return the
//!   parsed value together with the number of bytes consumed
//! - `size_*` functions report the encoded size without writing anything
//!
//! # Example
//!
//! ```
//! use protopack_wire::{append_bytes, append_tag, consume_bytes, consume_tag, Number, WireType};
//!
//! let mut b = Vec::new();
//! append_tag(&mut b, Number(3), WireType::Bytes);
//! append_bytes(&mut b, b"hello");
//!
//! let (num, typ, n) = consume_tag(&b).unwrap();
//! assert_eq!((num, typ), (Number(3), WireType::Bytes));
//! let (v, m) = consume_bytes(&b[n..]).unwrap();
//! assert_eq!(v, b"hello");
//! assert_eq!(n + m, b.len());
//! ```

mod error;
mod field;
mod tag;
mod varint;

pub use error::WireError;
pub use field::{
    append_bytes, append_fixed32, append_fixed64, consume_bytes, consume_field,
    consume_field_value, consume_fixed32, consume_fixed64, consume_group, size_bytes,
    size_fixed32, size_fixed64, DEFAULT_RECURSION_LIMIT,
};
pub use tag::{append_tag, consume_tag, decode_tag, encode_tag, size_tag, Number, WireType};
pub use varint::{
    append_varint, consume_varint, decode_zig_zag, encode_zig_zag, size_varint,
};
