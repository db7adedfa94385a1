use std::sync::Arc;

use protopack::codec;
use protopack::{
    Cardinality, CodecError, ExtensionRegistry, ExtensionType, Kind, MarshalOptions, Message,
    MessageDescriptor, Number, UnmarshalOptions, Value, WireType,
};
use protopack_wire::WireError;

fn base() -> Arc<MessageDescriptor> {
    Arc::new(MessageDescriptor::new("test.Base"))
}

fn encode(m: &Message) -> Vec<u8> {
    let bytes = MarshalOptions::default()
        .marshal(m)
        .unwrap_or_else(|e| panic!("marshal failed: {e}"));
    assert_eq!(bytes.len(), MarshalOptions::default().size(m), "size/marshal mismatch");
    bytes
}

fn decode(desc: &Arc<MessageDescriptor>, reg: &ExtensionRegistry, b: &[u8]) -> Message {
    let mut m = Message::new(desc.clone());
    let n = UnmarshalOptions::with_resolver(reg)
        .unmarshal(b, &mut m)
        .unwrap_or_else(|e| panic!("unmarshal failed: {e}"));
    assert_eq!(n, b.len());
    m
}

#[test]
fn empty_store_emits_unknown_tail_only() {
    let desc = base();
    let mut m = Message::new(desc.clone());
    assert!(encode(&m).is_empty());

    m.append_unknown(&[0x08, 0x01, 0x7a, 0x00]);
    assert_eq!(encode(&m), [0x08, 0x01, 0x7a, 0x00]);

    // A store that exists but is empty behaves the same.
    m.extensions_mut();
    assert_eq!(encode(&m), [0x08, 0x01, 0x7a, 0x00]);
}

#[test]
fn single_extension_is_stable() {
    let desc = base();
    let xt = Arc::new(ExtensionType::new(&desc, "test.s", 300, Kind::String));
    let mut m = Message::new(desc);
    m.set_extension(&xt, "ok".into()).unwrap();
    let first = encode(&m);
    assert_eq!(first, [0xe2, 0x12, 0x02, b'o', b'k']);
    for _ in 0..8 {
        assert_eq!(encode(&m), first);
    }
}

#[test]
fn multiple_extensions_are_sorted_by_number() {
    let desc = base();
    let mut m = Message::new(desc.clone());
    for num in [5, 2, 9] {
        let xt = Arc::new(ExtensionType::new(&desc, format!("test.e{num}"), num, Kind::Int32));
        m.set_extension(&xt, Value::I32(num)).unwrap();
    }
    m.append_unknown(&[0x18, 0x00]);
    assert_eq!(
        encode(&m),
        [0x10, 0x02, 0x28, 0x05, 0x48, 0x09, 0x18, 0x00]
    );
}

#[test]
fn round_trip_preserves_extensions_and_unknowns() {
    let desc = base();
    let mut reg = ExtensionRegistry::new();
    let a = reg
        .register(ExtensionType::new(&desc, "test.a", 1, Kind::Sint64))
        .unwrap();
    let b = reg
        .register(ExtensionType::new(&desc, "test.b", 4, Kind::Double))
        .unwrap();
    let c = reg
        .register(ExtensionType::new(&desc, "test.c", 7, Kind::Bytes))
        .unwrap();

    let mut m = Message::new(desc.clone());
    m.set_extension(&a, Value::I64(-150)).unwrap();
    m.set_extension(&b, Value::F64(2.5)).unwrap();
    m.set_extension(&c, Value::Bytes(vec![1, 2, 3])).unwrap();
    m.append_unknown(&[0x10, 0x2a, 0x2d, 0x01, 0x00, 0x00, 0x00]);

    let bytes = encode(&m);
    let decoded = decode(&desc, &reg, &bytes);
    assert_eq!(decoded, m);
    assert_eq!(encode(&decoded), bytes);
}

#[test]
fn unknown_fields_keep_wire_order() {
    let desc = base();
    let mut reg = ExtensionRegistry::new();
    reg.register(ExtensionType::new(&desc, "test.flag", 3, Kind::Bool))
        .unwrap();

    // unknown 1, extension 3, unknown 2 (group), unknown 15 (fixed64)
    let wire = [
        0x08, 0x01, 0x18, 0x01, 0x13, 0x08, 0x05, 0x14, 0x79, 1, 2, 3, 4, 5, 6, 7, 8,
    ];
    let m = decode(&desc, &reg, &wire);
    assert_eq!(m.get_extension(3), Some(&Value::Bool(true)));
    assert_eq!(
        m.unknown(),
        [0x08, 0x01, 0x13, 0x08, 0x05, 0x14, 0x79, 1, 2, 3, 4, 5, 6, 7, 8]
    );
}

#[test]
fn discard_unknown_drops_unrecognized_fields() {
    let desc = base();
    let mut reg = ExtensionRegistry::new();
    reg.register(ExtensionType::new(&desc, "test.n", 2, Kind::Uint64))
        .unwrap();
    let opts = UnmarshalOptions {
        discard_unknown: true,
        ..UnmarshalOptions::with_resolver(&reg)
    };
    let mut m = Message::new(desc);
    opts.unmarshal(&[0x08, 0x01, 0x10, 0x03, 0x1a, 0x00], &mut m)
        .unwrap();
    assert_eq!(m.get_extension(2), Some(&Value::U64(3)));
    assert!(m.unknown().is_empty());
}

#[test]
fn last_scalar_wins_and_repeated_accumulates() {
    let desc = base();
    let mut reg = ExtensionRegistry::new();
    reg.register(ExtensionType::new(&desc, "test.one", 1, Kind::Int32))
        .unwrap();
    reg.register(
        ExtensionType::new(&desc, "test.many", 2, Kind::Int32)
            .with_cardinality(Cardinality::Repeated),
    )
    .unwrap();

    let m = decode(
        &desc,
        &reg,
        &[0x08, 0x01, 0x10, 0x01, 0x08, 0x02, 0x12, 0x02, 0x03, 0x04, 0x10, 0x05],
    );
    assert_eq!(m.get_extension(1), Some(&Value::I32(2)));
    assert_eq!(
        m.get_extension(2),
        Some(&Value::List(vec![
            Value::I32(1),
            Value::I32(3),
            Value::I32(4),
            Value::I32(5)
        ]))
    );
    // Repeated non-packed fields re-encode one tag per element.
    assert_eq!(
        encode(&m),
        [0x08, 0x02, 0x10, 0x01, 0x10, 0x03, 0x10, 0x04, 0x10, 0x05]
    );
}

#[test]
fn packed_extension_encodes_one_field() {
    let desc = base();
    let mut reg = ExtensionRegistry::new();
    let xt = reg
        .register(
            ExtensionType::new(&desc, "test.packed", 6, Kind::Fixed32)
                .with_cardinality(Cardinality::Packed),
        )
        .unwrap();
    let mut m = Message::new(desc.clone());
    m.set_extension(&xt, Value::List(vec![Value::U32(1), Value::U32(2)]))
        .unwrap();
    let bytes = encode(&m);
    assert_eq!(bytes, [0x32, 0x08, 1, 0, 0, 0, 2, 0, 0, 0]);

    // Unpacked input for a packed declaration is accepted too.
    let unpacked = [0x35, 1, 0, 0, 0, 0x35, 2, 0, 0, 0];
    assert_eq!(decode(&desc, &reg, &unpacked), m);
    assert_eq!(decode(&desc, &reg, &bytes), m);
}

#[test]
fn nested_message_extensions() {
    let outer = Arc::new(MessageDescriptor::new("test.Outer"));
    let inner = Arc::new(MessageDescriptor::new("test.Inner"));
    let mut reg = ExtensionRegistry::new();
    let child = reg
        .register(ExtensionType::message(&outer, "test.child", 10, &inner))
        .unwrap();
    let leaf = reg
        .register(ExtensionType::new(&inner, "test.leaf", 1, Kind::Int32))
        .unwrap();

    let mut im = Message::new(inner.clone());
    im.set_extension(&leaf, Value::I32(5)).unwrap();
    let mut om = Message::new(outer.clone());
    om.set_extension(&child, im.into()).unwrap();

    let bytes = encode(&om);
    assert_eq!(bytes, [0x52, 0x02, 0x08, 0x05]);
    assert_eq!(decode(&outer, &reg, &bytes), om);

    // Two occurrences merge into one nested message.
    let merged = decode(&outer, &reg, &[0x52, 0x02, 0x08, 0x05, 0x52, 0x02, 0x10, 0x07]);
    let Some(Value::Message(nested)) = merged.get_extension(10) else {
        panic!("expected nested message");
    };
    assert_eq!(nested.get_extension(1), Some(&Value::I32(5)));
    assert_eq!(nested.unknown(), [0x10, 0x07]);
}

#[test]
fn nesting_beyond_recursion_limit_fails() {
    let outer = Arc::new(MessageDescriptor::new("test.Outer"));
    let mut reg = ExtensionRegistry::new();
    reg.register(ExtensionType::message(&outer, "test.self", 1, &outer))
        .unwrap();
    let wire = [0x0a, 0x04, 0x0a, 0x02, 0x0a, 0x00];

    let shallow = UnmarshalOptions {
        recursion_limit: 2,
        ..UnmarshalOptions::with_resolver(&reg)
    };
    let mut m = Message::new(outer.clone());
    assert_eq!(
        shallow.unmarshal(&wire, &mut m),
        Err(CodecError::MalformedWire(WireError::RecursionLimit))
    );

    let deep = UnmarshalOptions {
        recursion_limit: 3,
        ..UnmarshalOptions::with_resolver(&reg)
    };
    let mut m = Message::new(outer);
    assert_eq!(deep.unmarshal(&wire, &mut m), Ok(wire.len()));
}

#[test]
fn recursion_limit_keeps_existing_nested_message() {
    let outer = Arc::new(MessageDescriptor::new("test.Outer"));
    let mut reg = ExtensionRegistry::new();
    let this = reg
        .register(ExtensionType::message(&outer, "test.self", 1, &outer))
        .unwrap();

    let mut nested = Message::new(outer.clone());
    nested.append_unknown(&[0x10, 0x07]);
    let mut m = Message::new(outer.clone());
    m.set_extension(&this, nested.clone().into()).unwrap();

    let exhausted = UnmarshalOptions {
        recursion_limit: 0,
        ..UnmarshalOptions::with_resolver(&reg)
    };
    assert_eq!(
        exhausted.unmarshal(&[0x0a, 0x00], &mut m),
        Err(CodecError::MalformedWire(WireError::RecursionLimit))
    );
    assert!(m.has_extension(1));
    assert_eq!(m.get_extension(1), Some(&Value::from(nested)));
}

#[test]
fn unset_and_uncodable_extensions_are_skipped() {
    let desc = base();
    let group = Arc::new(ExtensionType::new(&desc, "test.g", 8, Kind::Group));
    let unset = Arc::new(ExtensionType::new(&desc, "test.u", 9, Kind::Int32));
    let mut m = Message::new(desc);
    m.set_extension(&group, Value::Bytes(vec![1])).unwrap();
    m.extensions_mut().get_or_create(&unset);
    assert_eq!(m.extensions().map(|s| s.len()), Some(2));
    assert!(encode(&m).is_empty());
}

#[test]
fn value_kind_mismatch_fails_marshal() {
    let desc = base();
    let xt = Arc::new(ExtensionType::new(&desc, "test.n", 2, Kind::Uint32));
    let mut m = Message::new(desc);
    m.set_extension(&xt, Value::Str("nope".into())).unwrap();
    assert_eq!(MarshalOptions::default().size(&m), 0);
    assert_eq!(
        MarshalOptions::default().marshal(&m),
        Err(CodecError::ValueMismatch {
            number: 2,
            expected: "uint32"
        })
    );
}

#[test]
fn malformed_input_matrix() {
    let desc = base();
    let cases: &[(&[u8], WireError)] = &[
        (&[0x08], WireError::UnexpectedEof),
        (&[0x0a, 0x03, 0x00], WireError::UnexpectedEof),
        (&[0x0c], WireError::EndGroupMismatch),
        (&[0x0b, 0x14], WireError::EndGroupMismatch),
        (&[0x0e], WireError::InvalidWireType(6)),
        (&[0x00], WireError::InvalidFieldNumber),
        (
            &[0x08, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02],
            WireError::VarintOverflow,
        ),
    ];
    for (wire, expected) in cases {
        let mut m = Message::new(desc.clone());
        let err = codec::unmarshal(wire, &mut m, &UnmarshalOptions::default()).unwrap_err();
        assert_eq!(err, CodecError::MalformedWire(*expected), "input {wire:02x?}");
        assert!(err.is_malformed());
    }
}

#[test]
fn unknown_extension_number_stays_unknown() {
    let desc = base();
    let other = Arc::new(MessageDescriptor::new("test.Other"));
    let mut reg = ExtensionRegistry::new();
    reg.register(ExtensionType::new(&other, "test.x", 1, Kind::Int32))
        .unwrap();
    let m = decode(&desc, &reg, &[0x08, 0x01]);
    assert!(!m.has_extension(1));
    assert_eq!(m.unknown(), [0x08, 0x01]);
    assert_eq!(Number(1).get(), 1);
    assert_eq!(WireType::from_u8(0), Ok(WireType::Varint));
}
