//! Minimal schema handles: message descriptors and extension types.

use std::sync::Arc;

use protopack_wire::{encode_tag, Number, WireType};

use crate::coder::{coder_for, ValueCoder};
use crate::messageset::EXTENSION_NAME;

/// The parts of a message schema the codec needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    full_name: String,
    message_set: bool,
}

impl MessageDescriptor {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            message_set: false,
        }
    }

    /// A message declared with the legacy message-set wire format.
    pub fn message_set(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            message_set: true,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_message_set(&self) -> bool {
        self.message_set
    }
}

/// Scalar or composite type of an extension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Enum,
    Int32,
    Sint32,
    Uint32,
    Int64,
    Sint64,
    Uint64,
    Sfixed32,
    Fixed32,
    Float,
    Sfixed64,
    Fixed64,
    Double,
    String,
    Bytes,
    Message,
    Group,
}

impl Kind {
    pub fn wire_type(self) -> WireType {
        match self {
            Kind::Bool
            | Kind::Enum
            | Kind::Int32
            | Kind::Sint32
            | Kind::Uint32
            | Kind::Int64
            | Kind::Sint64
            | Kind::Uint64 => WireType::Varint,
            Kind::Sfixed32 | Kind::Fixed32 | Kind::Float => WireType::Fixed32,
            Kind::Sfixed64 | Kind::Fixed64 | Kind::Double => WireType::Fixed64,
            Kind::String | Kind::Bytes | Kind::Message => WireType::Bytes,
            Kind::Group => WireType::StartGroup,
        }
    }

    /// Numeric kinds may be packed into a single length-delimited value.
    pub fn is_packable(self) -> bool {
        !matches!(
            self,
            Kind::String | Kind::Bytes | Kind::Message | Kind::Group
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Enum => "enum",
            Kind::Int32 => "int32",
            Kind::Sint32 => "sint32",
            Kind::Uint32 => "uint32",
            Kind::Int64 => "int64",
            Kind::Sint64 => "sint64",
            Kind::Uint64 => "uint64",
            Kind::Sfixed32 => "sfixed32",
            Kind::Fixed32 => "fixed32",
            Kind::Float => "float",
            Kind::Sfixed64 => "sfixed64",
            Kind::Fixed64 => "fixed64",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Message => "message",
            Kind::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Singular,
    Repeated,
    Packed,
}

/// A field type descriptor for one extension.
///
/// Built once, shared through `Arc` by every message that carries the
/// extension, and never mutated afterwards.
#[derive(Debug)]
pub struct ExtensionType {
    extendee: Arc<MessageDescriptor>,
    full_name: String,
    number: Number,
    kind: Kind,
    cardinality: Cardinality,
    message_type: Option<Arc<MessageDescriptor>>,
    wire_tag: u64,
    coder: Option<Arc<dyn ValueCoder>>,
}

impl ExtensionType {
    /// A singular extension of a non-message kind.
    ///
    /// Message-typed extensions need [`ExtensionType::message`]; a
    /// `Kind::Message` built here has no coder.
    pub fn new(
        extendee: &Arc<MessageDescriptor>,
        full_name: impl Into<String>,
        number: i32,
        kind: Kind,
    ) -> Self {
        Self::build(
            extendee.clone(),
            full_name.into(),
            Number(number),
            kind,
            Cardinality::Singular,
            None,
        )
    }

    /// A singular extension carrying a nested message.
    pub fn message(
        extendee: &Arc<MessageDescriptor>,
        full_name: impl Into<String>,
        number: i32,
        message_type: &Arc<MessageDescriptor>,
    ) -> Self {
        Self::build(
            extendee.clone(),
            full_name.into(),
            Number(number),
            Kind::Message,
            Cardinality::Singular,
            Some(message_type.clone()),
        )
    }

    pub fn with_cardinality(self, cardinality: Cardinality) -> Self {
        Self::build(
            self.extendee,
            self.full_name,
            self.number,
            self.kind,
            cardinality,
            self.message_type,
        )
    }

    fn build(
        extendee: Arc<MessageDescriptor>,
        full_name: String,
        number: Number,
        kind: Kind,
        cardinality: Cardinality,
        message_type: Option<Arc<MessageDescriptor>>,
    ) -> Self {
        let cardinality = match cardinality {
            Cardinality::Packed if !kind.is_packable() => Cardinality::Repeated,
            other => other,
        };
        let wire_type = match cardinality {
            Cardinality::Packed => WireType::Bytes,
            _ => kind.wire_type(),
        };
        let coder = coder_for(kind, cardinality, message_type.as_ref());
        Self {
            extendee,
            full_name,
            number,
            kind,
            cardinality,
            message_type,
            wire_tag: encode_tag(number, wire_type),
            coder,
        }
    }

    pub fn extendee(&self) -> &Arc<MessageDescriptor> {
        &self.extendee
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The last dot-separated segment of the full name.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }

    pub fn number(&self) -> Number {
        self.number
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn message_type(&self) -> Option<&Arc<MessageDescriptor>> {
        self.message_type.as_ref()
    }

    /// Tag emitted before each value in the modern encoding.
    pub fn wire_tag(&self) -> u64 {
        self.wire_tag
    }

    /// Size/marshal/unmarshal functions. `None` for kinds this build cannot encode.
    pub fn coder(&self) -> Option<&Arc<dyn ValueCoder>> {
        self.coder.as_ref()
    }

    /// Only singular message values fit inside a message-set item.
    pub fn fits_message_set(&self) -> bool {
        self.kind == Kind::Message && self.cardinality == Cardinality::Singular
    }

    /// Reports whether this is the conventional extension that carries its own
    /// message type into a message set: named `message_set_extension` and
    /// declared inside that message type.
    pub fn is_message_set_extension(&self) -> bool {
        if self.name() != EXTENSION_NAME || !self.extendee.is_message_set() {
            return false;
        }
        let parent = self
            .full_name
            .rsplit_once('.')
            .map_or("", |(parent, _)| parent);
        self.message_type
            .as_ref()
            .is_some_and(|mt| mt.full_name() == parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_tag_follows_cardinality() {
        let ext = Arc::new(MessageDescriptor::new("pkg.Base"));
        let single = ExtensionType::new(&ext, "pkg.a", 10, Kind::Int32);
        assert_eq!(single.wire_tag(), encode_tag(Number(10), WireType::Varint));

        let packed = ExtensionType::new(&ext, "pkg.b", 11, Kind::Fixed32)
            .with_cardinality(Cardinality::Packed);
        assert_eq!(packed.wire_tag(), encode_tag(Number(11), WireType::Bytes));

        let strings = ExtensionType::new(&ext, "pkg.c", 12, Kind::String)
            .with_cardinality(Cardinality::Packed);
        assert_eq!(strings.cardinality(), Cardinality::Repeated);
    }

    #[test]
    fn group_and_untyped_message_have_no_coder() {
        let ext = Arc::new(MessageDescriptor::new("pkg.Base"));
        assert!(ExtensionType::new(&ext, "pkg.g", 1, Kind::Group)
            .coder()
            .is_none());
        assert!(ExtensionType::new(&ext, "pkg.m", 2, Kind::Message)
            .coder()
            .is_none());
        assert!(ExtensionType::new(&ext, "pkg.s", 3, Kind::Sint64)
            .coder()
            .is_some());
    }

    #[test]
    fn message_set_extension_detection() {
        let set = Arc::new(MessageDescriptor::message_set("pkg.Set"));
        let payload = Arc::new(MessageDescriptor::new("pkg.Payload"));

        let conventional =
            ExtensionType::message(&set, "pkg.Payload.message_set_extension", 100, &payload);
        assert!(conventional.is_message_set_extension());
        assert_eq!(conventional.name(), "message_set_extension");

        let misplaced =
            ExtensionType::message(&set, "pkg.Other.message_set_extension", 101, &payload);
        assert!(!misplaced.is_message_set_extension());

        let renamed = ExtensionType::message(&set, "pkg.Payload.ext", 102, &payload);
        assert!(!renamed.is_message_set_extension());

        let plain = Arc::new(MessageDescriptor::new("pkg.Plain"));
        let not_a_set =
            ExtensionType::message(&plain, "pkg.Payload.message_set_extension", 103, &payload);
        assert!(!not_a_set.is_message_set_extension());
    }
}
