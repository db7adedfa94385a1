use std::sync::Arc;

use proptest::prelude::*;
use protopack::{
    ExtensionRegistry, ExtensionType, Kind, MarshalOptions, Message, MessageDescriptor, Number,
    UnmarshalOptions, Value, WireType,
};
use protopack_wire::{append_bytes, append_tag};

fn entries() -> impl Strategy<Value = Vec<(i32, i64)>> {
    prop::collection::btree_map(1i32..2000, any::<i64>(), 0..12)
        .prop_map(|m| m.into_iter().collect())
}

fn unknown_tail() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((3000i32..4000, prop::collection::vec(any::<u8>(), 0..8)), 0..6)
        .prop_map(|fields| {
            let mut b = Vec::new();
            for (num, payload) in fields {
                append_tag(&mut b, Number(num), WireType::Bytes);
                append_bytes(&mut b, &payload);
            }
            b
        })
}

fn build(
    desc: &Arc<MessageDescriptor>,
    reg: &mut ExtensionRegistry,
    entries: &[(i32, i64)],
) -> Message {
    let mut m = Message::new(desc.clone());
    for &(num, v) in entries {
        let xt = Arc::new(ExtensionType::new(desc, format!("prop.e{num}"), num, Kind::Sint64));
        // Registration fails only for numbers already present.
        let _ = reg.register(ExtensionType::new(desc, format!("prop.e{num}"), num, Kind::Sint64));
        m.set_extension(&xt, Value::I64(v)).unwrap();
    }
    m
}

proptest! {
    #[test]
    fn encoding_ignores_insertion_order(
        (ordered, shuffled) in entries().prop_flat_map(|e| (Just(e.clone()), Just(e).prop_shuffle()))
    ) {
        let desc = Arc::new(MessageDescriptor::new("prop.M"));
        let mut reg = ExtensionRegistry::new();
        let a = build(&desc, &mut reg, &ordered);
        let b = build(&desc, &mut reg, &shuffled);
        let opts = MarshalOptions::default();
        prop_assert_eq!(opts.marshal(&a).unwrap(), opts.marshal(&b).unwrap());
    }

    #[test]
    fn round_trip_preserves_everything(e in entries(), tail in unknown_tail()) {
        let desc = Arc::new(MessageDescriptor::new("prop.M"));
        let mut reg = ExtensionRegistry::new();
        let mut m = build(&desc, &mut reg, &e);
        m.append_unknown(&tail);

        let opts = MarshalOptions::default();
        let bytes = opts.marshal(&m).unwrap();
        prop_assert_eq!(bytes.len(), opts.size(&m));

        let mut decoded = Message::new(desc.clone());
        UnmarshalOptions::with_resolver(&reg).unmarshal(&bytes, &mut decoded).unwrap();
        prop_assert_eq!(&decoded, &m);
        prop_assert_eq!(decoded.unknown(), &tail[..]);
        prop_assert_eq!(opts.marshal(&decoded).unwrap(), bytes);
    }

    #[test]
    fn unknown_only_messages_are_byte_identical(tail in unknown_tail()) {
        let desc = Arc::new(MessageDescriptor::new("prop.M"));
        let mut m = Message::new(desc);
        UnmarshalOptions::default().unmarshal(&tail, &mut m).unwrap();
        prop_assert_eq!(MarshalOptions::default().marshal(&m).unwrap(), tail);
    }
}
