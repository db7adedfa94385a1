use std::sync::Arc;

use protopack_wire::{append_tag, encode_tag, size_tag, Number, WireType};
use tracing::debug;

use super::{
    append_field_end, append_field_start, append_unknown, parse, size_field, size_unknown,
    FIELD_MESSAGE,
};
use crate::codec::{preserve_unknown, unmarshal_extension};
use crate::extension::{for_each_in_wire_order, ExtensionField};
use crate::{CodecError, MarshalOptions, Message, UnmarshalOptions, Value, ValueCoder};

/// The coder and value of a field that can be written as an item.
fn encodable(field: &ExtensionField) -> Option<(&Arc<dyn ValueCoder>, &Value)> {
    let xt = field.extension_type();
    if !xt.fits_message_set() {
        return None;
    }
    Some((xt.coder()?, field.value()?))
}

pub(crate) fn size_message_set(m: &Message, opts: MarshalOptions) -> usize {
    if !opts.flags.proto_legacy {
        return 0;
    }
    let mut size = 0;
    if let Some(store) = m.extensions() {
        for field in store.fields() {
            if let Some((coder, v)) = encodable(field) {
                size += size_field(field.extension_type().number());
                size += coder.size(v, size_tag(FIELD_MESSAGE), opts);
            }
        }
    }
    size + size_unknown(m.unknown())
}

pub(crate) fn marshal_message_set(
    b: &mut Vec<u8>,
    m: &Message,
    opts: MarshalOptions,
) -> Result<(), CodecError> {
    if !opts.flags.proto_legacy {
        debug!(message = m.descriptor().full_name(), "message set encoding is disabled");
        return Err(CodecError::UnsupportedEncoding);
    }
    if let Some(store) = m.extensions() {
        let message_tag = encode_tag(FIELD_MESSAGE, WireType::Bytes);
        for_each_in_wire_order(store, |field| {
            let Some((coder, v)) = encodable(field) else {
                return Ok(());
            };
            append_field_start(b, field.extension_type().number());
            coder.marshal(b, v, message_tag, opts)?;
            append_field_end(b);
            Ok(())
        })?;
    }
    append_unknown(b, m.unknown())?;
    Ok(())
}

pub(crate) fn unmarshal_message_set(
    b: &[u8],
    m: &mut Message,
    opts: &UnmarshalOptions<'_>,
) -> Result<usize, CodecError> {
    if !opts.flags.proto_legacy {
        debug!(message = m.descriptor().full_name(), "message set decoding is disabled");
        return Err(CodecError::UnsupportedEncoding);
    }
    let rest = parse(b, opts.strict_message_set, |num: Number, v: &[u8]| {
        if unmarshal_extension(v, num, WireType::Bytes, m, opts)?.is_none() {
            let mut raw = Vec::with_capacity(size_tag(num) + v.len());
            append_tag(&mut raw, num, WireType::Bytes);
            raw.extend_from_slice(v);
            preserve_unknown(m, &raw, opts);
        }
        Ok::<_, CodecError>(())
    })?;
    if !rest.is_empty() {
        debug!(
            message = m.descriptor().full_name(),
            len = rest.len(),
            "keeping malformed message set remainder"
        );
        preserve_unknown(m, rest, opts);
    }
    Ok(b.len())
}
