//! Per-kind value coders used by extension fields.

use std::fmt;
use std::sync::Arc;

use protopack_wire::{
    append_bytes, append_fixed32, append_fixed64, append_varint, consume_bytes, consume_fixed32,
    consume_fixed64, consume_varint, decode_zig_zag, encode_zig_zag, size_bytes, size_varint,
    Number, WireType,
};

use crate::descriptor::{Cardinality, Kind, MessageDescriptor};
use crate::{codec, CodecError, MarshalOptions, Message, UnmarshalOptions, Value};

/// Size, marshal and unmarshal functions for one extension's values.
pub trait ValueCoder: fmt::Debug + Send + Sync {
    /// Encoded size of `v` including its tag(s). Zero if `v` does not match
    /// the coder's kind.
    fn size(&self, v: &Value, tag_size: usize, opts: MarshalOptions) -> usize;

    /// Appends `v` using `wire_tag` as the field tag.
    fn marshal(
        &self,
        b: &mut Vec<u8>,
        v: &Value,
        wire_tag: u64,
        opts: MarshalOptions,
    ) -> Result<(), CodecError>;

    /// Decodes one field value from `b` (positioned after the tag) and merges
    /// it into `prev`.
    ///
    /// Returns `Ok(None)` if `typ` is not a wire type this coder accepts.
    fn unmarshal(
        &self,
        b: &[u8],
        prev: &mut Option<Value>,
        num: Number,
        typ: WireType,
        opts: &UnmarshalOptions<'_>,
    ) -> Result<Option<usize>, CodecError>;
}

pub(crate) fn coder_for(
    kind: Kind,
    cardinality: Cardinality,
    message_type: Option<&Arc<MessageDescriptor>>,
) -> Option<Arc<dyn ValueCoder>> {
    let elem: Arc<dyn ValueCoder> = match kind {
        Kind::Group => return None,
        Kind::Message => Arc::new(MessageCoder {
            desc: message_type?.clone(),
        }),
        _ => Arc::new(ScalarCoder { kind }),
    };
    Some(match cardinality {
        Cardinality::Singular => elem,
        Cardinality::Repeated => Arc::new(ListCoder {
            kind,
            elem,
            packed: false,
        }),
        Cardinality::Packed => Arc::new(ListCoder {
            kind,
            elem,
            packed: true,
        }),
    })
}

fn tag_number(wire_tag: u64) -> i32 {
    (wire_tag >> 3) as i32
}

fn mismatch(wire_tag: u64, kind: Kind) -> CodecError {
    CodecError::ValueMismatch {
        number: tag_number(wire_tag),
        expected: kind.name(),
    }
}

fn scalar_size(kind: Kind, v: &Value) -> Option<usize> {
    let n = match (kind, v) {
        (Kind::Bool, Value::Bool(_)) => 1,
        (Kind::Enum | Kind::Int32, Value::I32(x)) => size_varint(i64::from(*x) as u64),
        (Kind::Sint32, Value::I32(x)) => size_varint(encode_zig_zag(i64::from(*x))),
        (Kind::Uint32, Value::U32(x)) => size_varint(u64::from(*x)),
        (Kind::Int64, Value::I64(x)) => size_varint(*x as u64),
        (Kind::Sint64, Value::I64(x)) => size_varint(encode_zig_zag(*x)),
        (Kind::Uint64, Value::U64(x)) => size_varint(*x),
        (Kind::Sfixed32, Value::I32(_))
        | (Kind::Fixed32, Value::U32(_))
        | (Kind::Float, Value::F32(_)) => 4,
        (Kind::Sfixed64, Value::I64(_))
        | (Kind::Fixed64, Value::U64(_))
        | (Kind::Double, Value::F64(_)) => 8,
        (Kind::String, Value::Str(s)) => size_bytes(s.len()),
        (Kind::Bytes, Value::Bytes(v)) => size_bytes(v.len()),
        _ => return None,
    };
    Some(n)
}

/// Appends the value without a tag. Returns `false` on a kind mismatch,
/// leaving `b` untouched.
fn append_scalar(b: &mut Vec<u8>, kind: Kind, v: &Value) -> bool {
    match (kind, v) {
        (Kind::Bool, Value::Bool(x)) => append_varint(b, u64::from(*x)),
        (Kind::Enum | Kind::Int32, Value::I32(x)) => append_varint(b, i64::from(*x) as u64),
        (Kind::Sint32, Value::I32(x)) => append_varint(b, encode_zig_zag(i64::from(*x))),
        (Kind::Uint32, Value::U32(x)) => append_varint(b, u64::from(*x)),
        (Kind::Int64, Value::I64(x)) => append_varint(b, *x as u64),
        (Kind::Sint64, Value::I64(x)) => append_varint(b, encode_zig_zag(*x)),
        (Kind::Uint64, Value::U64(x)) => append_varint(b, *x),
        (Kind::Sfixed32, Value::I32(x)) => append_fixed32(b, *x as u32),
        (Kind::Fixed32, Value::U32(x)) => append_fixed32(b, *x),
        (Kind::Float, Value::F32(x)) => append_fixed32(b, x.to_bits()),
        (Kind::Sfixed64, Value::I64(x)) => append_fixed64(b, *x as u64),
        (Kind::Fixed64, Value::U64(x)) => append_fixed64(b, *x),
        (Kind::Double, Value::F64(x)) => append_fixed64(b, x.to_bits()),
        (Kind::String, Value::Str(s)) => append_bytes(b, s.as_bytes()),
        (Kind::Bytes, Value::Bytes(v)) => append_bytes(b, v),
        _ => return false,
    }
    true
}

/// Decodes one value of `kind` in its natural wire type.
fn decode_scalar(kind: Kind, b: &[u8], num: Number) -> Result<(Value, usize), CodecError> {
    let decoded = match kind.wire_type() {
        WireType::Varint => {
            let (v, n) = consume_varint(b)?;
            let value = match kind {
                Kind::Bool => Value::Bool(v != 0),
                Kind::Enum | Kind::Int32 => Value::I32(v as i32),
                Kind::Sint32 => Value::I32(decode_zig_zag(v & u64::from(u32::MAX)) as i32),
                Kind::Uint32 => Value::U32(v as u32),
                Kind::Int64 => Value::I64(v as i64),
                Kind::Sint64 => Value::I64(decode_zig_zag(v)),
                _ => Value::U64(v),
            };
            (value, n)
        }
        WireType::Fixed32 => {
            let (v, n) = consume_fixed32(b)?;
            let value = match kind {
                Kind::Sfixed32 => Value::I32(v as i32),
                Kind::Float => Value::F32(f32::from_bits(v)),
                _ => Value::U32(v),
            };
            (value, n)
        }
        WireType::Fixed64 => {
            let (v, n) = consume_fixed64(b)?;
            let value = match kind {
                Kind::Sfixed64 => Value::I64(v as i64),
                Kind::Double => Value::F64(f64::from_bits(v)),
                _ => Value::U64(v),
            };
            (value, n)
        }
        WireType::Bytes if kind == Kind::String => {
            let (v, n) = consume_bytes(b)?;
            let s = std::str::from_utf8(v)
                .map_err(|_| CodecError::InvalidUtf8 { number: num.get() })?;
            (Value::Str(s.to_owned()), n)
        }
        WireType::Bytes if kind == Kind::Bytes => {
            let (v, n) = consume_bytes(b)?;
            (Value::Bytes(v.to_vec()), n)
        }
        _ => {
            return Err(CodecError::ValueMismatch {
                number: num.get(),
                expected: kind.name(),
            })
        }
    };
    Ok(decoded)
}

/// Singular scalar, string or bytes values. The last value on the wire wins.
#[derive(Debug)]
struct ScalarCoder {
    kind: Kind,
}

impl ValueCoder for ScalarCoder {
    fn size(&self, v: &Value, tag_size: usize, _: MarshalOptions) -> usize {
        scalar_size(self.kind, v).map_or(0, |n| tag_size + n)
    }

    fn marshal(
        &self,
        b: &mut Vec<u8>,
        v: &Value,
        wire_tag: u64,
        _: MarshalOptions,
    ) -> Result<(), CodecError> {
        let start = b.len();
        append_varint(b, wire_tag);
        if !append_scalar(b, self.kind, v) {
            b.truncate(start);
            return Err(mismatch(wire_tag, self.kind));
        }
        Ok(())
    }

    fn unmarshal(
        &self,
        b: &[u8],
        prev: &mut Option<Value>,
        num: Number,
        typ: WireType,
        _: &UnmarshalOptions<'_>,
    ) -> Result<Option<usize>, CodecError> {
        if typ != self.kind.wire_type() {
            return Ok(None);
        }
        let (value, n) = decode_scalar(self.kind, b, num)?;
        *prev = Some(value);
        Ok(Some(n))
    }
}

/// Nested message values, length-delimited. Repeated occurrences merge.
#[derive(Debug)]
struct MessageCoder {
    desc: Arc<MessageDescriptor>,
}

impl MessageCoder {
    fn message<'v>(&self, v: &'v Value) -> Option<&'v Message> {
        match v {
            Value::Message(m) if m.descriptor().full_name() == self.desc.full_name() => Some(m),
            _ => None,
        }
    }
}

impl ValueCoder for MessageCoder {
    fn size(&self, v: &Value, tag_size: usize, opts: MarshalOptions) -> usize {
        self.message(v)
            .map_or(0, |m| tag_size + size_bytes(codec::size(m, opts)))
    }

    fn marshal(
        &self,
        b: &mut Vec<u8>,
        v: &Value,
        wire_tag: u64,
        opts: MarshalOptions,
    ) -> Result<(), CodecError> {
        let m = self
            .message(v)
            .ok_or_else(|| mismatch(wire_tag, Kind::Message))?;
        append_varint(b, wire_tag);
        append_varint(b, codec::size(m, opts) as u64);
        codec::marshal(b, m, opts)
    }

    fn unmarshal(
        &self,
        b: &[u8],
        prev: &mut Option<Value>,
        _: Number,
        typ: WireType,
        opts: &UnmarshalOptions<'_>,
    ) -> Result<Option<usize>, CodecError> {
        if typ != WireType::Bytes {
            return Ok(None);
        }
        let (v, n) = consume_bytes(b)?;
        let opts = opts.descend()?;
        let mut m = match prev.take() {
            Some(Value::Message(m)) => m,
            _ => Box::new(Message::new(self.desc.clone())),
        };
        let result = codec::unmarshal(v, &mut m, &opts);
        *prev = Some(Value::Message(m));
        result?;
        Ok(Some(n))
    }
}

/// Repeated values. Decoding accepts both packed and unpacked input for
/// packable kinds regardless of how the field is declared.
#[derive(Debug)]
struct ListCoder {
    kind: Kind,
    elem: Arc<dyn ValueCoder>,
    packed: bool,
}

impl ListCoder {
    fn packed_len(&self, items: &[Value]) -> Option<usize> {
        items.iter().map(|v| scalar_size(self.kind, v)).sum()
    }
}

impl ValueCoder for ListCoder {
    fn size(&self, v: &Value, tag_size: usize, opts: MarshalOptions) -> usize {
        let Value::List(items) = v else {
            return 0;
        };
        if !self.packed {
            return items.iter().map(|v| self.elem.size(v, tag_size, opts)).sum();
        }
        if items.is_empty() {
            return 0;
        }
        self.packed_len(items)
            .map_or(0, |n| tag_size + size_bytes(n))
    }

    fn marshal(
        &self,
        b: &mut Vec<u8>,
        v: &Value,
        wire_tag: u64,
        opts: MarshalOptions,
    ) -> Result<(), CodecError> {
        let Value::List(items) = v else {
            return Err(mismatch(wire_tag, self.kind));
        };
        if !self.packed {
            return items
                .iter()
                .try_for_each(|v| self.elem.marshal(b, v, wire_tag, opts));
        }
        if items.is_empty() {
            return Ok(());
        }
        let n = self
            .packed_len(items)
            .ok_or_else(|| mismatch(wire_tag, self.kind))?;
        append_varint(b, wire_tag);
        append_varint(b, n as u64);
        for v in items {
            append_scalar(b, self.kind, v);
        }
        Ok(())
    }

    fn unmarshal(
        &self,
        b: &[u8],
        prev: &mut Option<Value>,
        num: Number,
        typ: WireType,
        opts: &UnmarshalOptions<'_>,
    ) -> Result<Option<usize>, CodecError> {
        let packed_input = typ == WireType::Bytes && self.kind.is_packable();
        if !packed_input && typ != self.kind.wire_type() {
            return Ok(None);
        }
        let mut items = match prev.take() {
            Some(Value::List(items)) => items,
            _ => Vec::new(),
        };
        let result = if packed_input {
            decode_packed(self.kind, b, num, &mut items)
        } else {
            let mut slot = None;
            let result = self.elem.unmarshal(b, &mut slot, num, typ, opts);
            items.extend(slot);
            result
        };
        *prev = Some(Value::List(items));
        result
    }
}

fn decode_packed(
    kind: Kind,
    b: &[u8],
    num: Number,
    items: &mut Vec<Value>,
) -> Result<Option<usize>, CodecError> {
    let (mut payload, n) = consume_bytes(b)?;
    while !payload.is_empty() {
        let (v, m) = decode_scalar(kind, payload, num)?;
        items.push(v);
        payload = &payload[m..];
    }
    Ok(Some(n))
}
