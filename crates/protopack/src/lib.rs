//! Extension-aware binary wire codec.
//!
//! Messages are encoded as their extension fields followed by the raw bytes
//! of every field the decoder did not recognize, so unknown data survives a
//! decode/encode cycle byte for byte. Messages declared with the legacy
//! message-set wire format wrap each extension in a group item instead; see
//! [`messageset`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use protopack::{ExtensionRegistry, ExtensionType, Kind, MarshalOptions, Message,
//!     MessageDescriptor, UnmarshalOptions, Value};
//!
//! let base = Arc::new(MessageDescriptor::new("demo.Base"));
//! let mut registry = ExtensionRegistry::new();
//! let count = registry
//!     .register(ExtensionType::new(&base, "demo.count", 100, Kind::Uint32))
//!     .unwrap();
//!
//! let mut m = Message::new(base.clone());
//! m.set_extension(&count, Value::U32(7)).unwrap();
//! let bytes = MarshalOptions::default().marshal(&m).unwrap();
//!
//! let mut decoded = Message::new(base);
//! UnmarshalOptions::with_resolver(&registry)
//!     .unmarshal(&bytes, &mut decoded)
//!     .unwrap();
//! assert_eq!(decoded.get_extension(100), Some(&Value::U32(7)));
//! ```

mod coder;
mod descriptor;
mod error;
mod extension;
mod flags;
mod message;
mod options;
mod registry;
mod value;

pub mod codec;
pub mod messageset;

pub use coder::ValueCoder;
pub use descriptor::{Cardinality, ExtensionType, Kind, MessageDescriptor};
pub use error::CodecError;
pub use extension::{ExtensionField, ExtensionStore};
pub use flags::Flags;
pub use message::Message;
pub use messageset::MessageSetError;
pub use options::{MarshalOptions, UnmarshalOptions};
pub use registry::{EmptyResolver, ExtensionRegistry, ExtensionResolver, RegistryError};
pub use value::Value;

pub use protopack_wire::{Number, WireType};
