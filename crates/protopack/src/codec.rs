//! Size, marshal and unmarshal for whole messages.
//!
//! A message's wire form is its extension fields followed by its unknown
//! tail. Messages declared with the message-set wire format are routed to
//! [`crate::messageset`].

use protopack_wire::{consume_field_value, consume_tag, size_tag, Number, WireType};
use tracing::trace;

use crate::extension::{for_each_in_wire_order, ExtensionField};
use crate::{messageset, CodecError, MarshalOptions, Message, UnmarshalOptions};

/// Returns the encoded size of `m`.
///
/// The result equals the length [`marshal`] produces only when marshal
/// succeeds. Fields that cannot be encoded count as 0 here, e.g. a value
/// that does not match its kind, or a message-set unknown tail that is not
/// made of `num: Bytes` fields.
pub fn size(m: &Message, opts: MarshalOptions) -> usize {
    if m.descriptor().is_message_set() {
        return messageset::size_message_set(m, opts);
    }
    let extensions = m.extensions().map_or(0, |store| {
        store.fields().map(|field| size_field(field, opts)).sum()
    });
    extensions + m.unknown().len()
}

fn size_field(field: &ExtensionField, opts: MarshalOptions) -> usize {
    let xt = field.extension_type();
    match (xt.coder(), field.value()) {
        (Some(coder), Some(v)) => coder.size(v, size_tag(xt.number()), opts),
        _ => 0,
    }
}

/// Appends the encoding of `m` to `b`.
///
/// Output is deterministic: two or more extensions are written in ascending
/// field-number order, then the unknown tail verbatim.
pub fn marshal(b: &mut Vec<u8>, m: &Message, opts: MarshalOptions) -> Result<(), CodecError> {
    if m.descriptor().is_message_set() {
        return messageset::marshal_message_set(b, m, opts);
    }
    if let Some(store) = m.extensions() {
        for_each_in_wire_order(store, |field| {
            let xt = field.extension_type();
            match (xt.coder(), field.value()) {
                (Some(coder), Some(v)) => coder.marshal(b, v, xt.wire_tag(), opts),
                _ => Ok(()),
            }
        })?;
    }
    b.extend_from_slice(m.unknown());
    Ok(())
}

/// Decodes `b` and merges it into `m`. Returns the number of bytes consumed,
/// which is all of `b` on success.
pub fn unmarshal(
    b: &[u8],
    m: &mut Message,
    opts: &UnmarshalOptions<'_>,
) -> Result<usize, CodecError> {
    if m.descriptor().is_message_set() {
        return messageset::unmarshal_message_set(b, m, opts);
    }
    let mut rest = b;
    while !rest.is_empty() {
        let (num, typ, n) = consume_tag(rest)?;
        let body = &rest[n..];
        let len = match unmarshal_extension(body, num, typ, m, opts)? {
            Some(len) => len,
            None => {
                let len = consume_field_value(num, typ, body)?;
                preserve_unknown(m, &rest[..n + len], opts);
                len
            }
        };
        rest = &rest[n + len..];
    }
    Ok(b.len())
}

/// Decodes one field into the extension store if the resolver knows it.
///
/// `Ok(None)` means the field is unknown: no registered extension, no coder
/// for its kind, or a wire type the coder does not accept.
pub(crate) fn unmarshal_extension(
    body: &[u8],
    num: Number,
    typ: WireType,
    m: &mut Message,
    opts: &UnmarshalOptions<'_>,
) -> Result<Option<usize>, CodecError> {
    let Some(xt) = opts
        .resolver
        .find_extension_by_number(m.descriptor().full_name(), num)
    else {
        return Ok(None);
    };
    let Some(coder) = xt.coder().cloned() else {
        return Ok(None);
    };
    let store = m.extensions_mut();
    let mut slot = store.get_mut(num).and_then(ExtensionField::take_value);
    let result = coder.unmarshal(body, &mut slot, num, typ, opts);
    if let Some(v) = slot {
        store.get_or_create(&xt).set_value(v);
    }
    if let Ok(None) = result {
        trace!(number = num.get(), wire_type = ?typ, "extension wire type mismatch");
    }
    result
}

/// Keeps a raw field in the unknown tail unless unknown fields are discarded.
pub(crate) fn preserve_unknown(m: &mut Message, raw: &[u8], opts: &UnmarshalOptions<'_>) {
    if opts.discard_unknown {
        trace!(len = raw.len(), "discarding unknown field");
        return;
    }
    trace!(len = raw.len(), "preserving unknown field");
    m.append_unknown(raw);
}
