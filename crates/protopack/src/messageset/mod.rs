//! Legacy message-set wire format.
//!
//! A message set carries each extension as a group item instead of a plain
//! field:
//!
//! ```text
//! [1: StartGroup] [2: Varint type_id] [3: Bytes message] [1: EndGroup]
//! ```
//!
//! The type id is the extension's field number and the message field holds
//! the encoded extension value.

mod codec;

use std::borrow::Cow;

use protopack_wire::{
    append_bytes, append_tag, append_varint, consume_bytes, consume_field_value, consume_tag,
    consume_varint, size_bytes, size_tag, size_varint, Number, WireError, WireType,
};
use thiserror::Error;

pub(crate) use codec::{marshal_message_set, size_message_set, unmarshal_message_set};

pub const FIELD_ITEM: Number = Number(1);
pub const FIELD_TYPE_ID: Number = Number(2);
pub const FIELD_MESSAGE: Number = Number(3);

/// Name of the extension field conventionally declared by a message type so
/// that it can be carried in a message set.
pub const EXTENSION_NAME: &str = "message_set_extension";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MessageSetError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("invalid type_id in message set: {0}")]
    InvalidTypeId(u64),
    #[error("unknown field in message set is not length-delimited")]
    InvalidUnknown,
}

/// Size of an item's framing for type id `num`, excluding the message field.
pub fn size_field(num: Number) -> usize {
    2 * size_tag(FIELD_ITEM) + size_tag(FIELD_TYPE_ID) + size_varint(num.get() as u64)
}

/// Opens an item and writes its type id. The message field follows.
pub fn append_field_start(b: &mut Vec<u8>, num: Number) {
    append_tag(b, FIELD_ITEM, WireType::StartGroup);
    append_tag(b, FIELD_TYPE_ID, WireType::Varint);
    append_varint(b, num.get() as u64);
}

pub fn append_field_end(b: &mut Vec<u8>) {
    append_tag(b, FIELD_ITEM, WireType::EndGroup);
}

/// Consumes one `num: Bytes` field of a modern unknown tail.
fn consume_unknown(tail: &[u8]) -> Result<(Number, &[u8], usize), MessageSetError> {
    let (num, typ, n) = consume_tag(tail).map_err(|_| MessageSetError::InvalidUnknown)?;
    if typ != WireType::Bytes {
        return Err(MessageSetError::InvalidUnknown);
    }
    let (v, m) = consume_bytes(&tail[n..]).map_err(|_| MessageSetError::InvalidUnknown)?;
    Ok((num, v, n + m))
}

/// Size of `tail` once re-wrapped as items, or 0 if it cannot be.
pub fn size_unknown(mut tail: &[u8]) -> usize {
    let mut size = 0;
    while !tail.is_empty() {
        let Ok((num, v, n)) = consume_unknown(tail) else {
            return 0;
        };
        size += size_field(num) + size_tag(FIELD_MESSAGE) + size_bytes(v.len());
        tail = &tail[n..];
    }
    size
}

/// Re-wraps each `num: Bytes` field of a modern unknown tail as an item.
pub fn append_unknown(b: &mut Vec<u8>, mut tail: &[u8]) -> Result<(), MessageSetError> {
    while !tail.is_empty() {
        let (num, v, n) = consume_unknown(tail)?;
        append_field_start(b, num);
        append_tag(b, FIELD_MESSAGE, WireType::Bytes);
        append_bytes(b, v);
        append_field_end(b);
        tail = &tail[n..];
    }
    Ok(())
}

/// Parses one item body, starting right after its StartGroup tag.
///
/// Returns the type id (0 if absent), the length-prefixed message payload,
/// and the bytes consumed including the EndGroup tag. Several message fields
/// are merged into one payload; a missing one yields an empty message.
pub fn consume_item(b: &[u8]) -> Result<(Number, Cow<'_, [u8]>, usize), MessageSetError> {
    let mut rest = b;
    let mut type_id = Number(0);
    let mut message: Option<Cow<'_, [u8]>> = None;
    loop {
        let (num, typ, n) = consume_tag(rest)?;
        rest = &rest[n..];
        match (num, typ) {
            (FIELD_ITEM, WireType::EndGroup) => {
                let message = message.unwrap_or(Cow::Borrowed(&[0]));
                return Ok((type_id, message, b.len() - rest.len()));
            }
            (FIELD_TYPE_ID, WireType::Varint) => {
                let (v, n) = consume_varint(rest)?;
                rest = &rest[n..];
                if !(1..=i32::MAX as u64).contains(&v) {
                    return Err(MessageSetError::InvalidTypeId(v));
                }
                type_id = Number(v as i32);
            }
            (FIELD_MESSAGE, WireType::Bytes) => {
                let (v, n) = consume_bytes(rest)?;
                message = Some(match message {
                    None => Cow::Borrowed(&rest[..n]),
                    Some(prev) => Cow::Owned(merge_payloads(&prev, v)?),
                });
                rest = &rest[n..];
            }
            _ => {
                let n = consume_field_value(num, typ, rest)?;
                rest = &rest[n..];
            }
        }
    }
}

/// Concatenates a length-prefixed payload with a bare one and re-prefixes it.
fn merge_payloads(prev: &[u8], more: &[u8]) -> Result<Vec<u8>, MessageSetError> {
    let (head, _) = consume_bytes(prev)?;
    let mut merged = Vec::with_capacity(size_bytes(head.len() + more.len()));
    append_varint(&mut merged, (head.len() + more.len()) as u64);
    merged.extend_from_slice(head);
    merged.extend_from_slice(more);
    Ok(merged)
}

/// Walks the items of an encoded message set, calling `f(type_id, payload)`
/// for each item that names a type id.
///
/// Top-level fields other than items are skipped. On success the returned
/// slice is empty. A malformed item fails the call when `strict`; otherwise
/// parsing stops and the malformed remainder is returned.
pub fn parse<'a, F, E>(b: &'a [u8], strict: bool, mut f: F) -> Result<&'a [u8], E>
where
    F: FnMut(Number, &[u8]) -> Result<(), E>,
    E: From<MessageSetError>,
{
    let mut rest = b;
    while !rest.is_empty() {
        let (type_id, payload, n) = match next_item(rest) {
            Ok(item) => item,
            Err(err) if strict => return Err(err.into()),
            Err(_) => return Ok(rest),
        };
        rest = &rest[n..];
        if let Some(payload) = payload {
            if type_id.get() != 0 {
                f(type_id, &payload[..])?;
            }
        }
    }
    Ok(rest)
}

/// Consumes one top-level field. Non-item fields yield no payload.
fn next_item(b: &[u8]) -> Result<(Number, Option<Cow<'_, [u8]>>, usize), MessageSetError> {
    let (num, typ, n) = consume_tag(b)?;
    if num != FIELD_ITEM || typ != WireType::StartGroup {
        let m = consume_field_value(num, typ, &b[n..])?;
        return Ok((num, None, n + m));
    }
    let (type_id, payload, m) = consume_item(&b[n..])?;
    Ok((type_id, Some(payload), n + m))
}
