//! Message instances.

use std::sync::Arc;

use protopack_wire::Number;

use crate::{CodecError, ExtensionStore, ExtensionType, MessageDescriptor, Value};

/// A message value: its schema handle, extension fields and unknown tail.
///
/// Ordinary schema fields are not modelled here; on decode they land in the
/// unknown tail and are re-emitted verbatim.
#[derive(Debug, Clone)]
pub struct Message {
    desc: Arc<MessageDescriptor>,
    extensions: Option<ExtensionStore>,
    unknown: Vec<u8>,
}

impl Message {
    pub fn new(desc: Arc<MessageDescriptor>) -> Self {
        Self {
            desc,
            extensions: None,
            unknown: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.desc
    }

    /// The extension store, if one has been created.
    pub fn extensions(&self) -> Option<&ExtensionStore> {
        self.extensions.as_ref()
    }

    /// The extension store, created empty on first use.
    pub fn extensions_mut(&mut self) -> &mut ExtensionStore {
        self.extensions.get_or_insert_with(ExtensionStore::new)
    }

    pub fn set_extension(&mut self, xt: &Arc<ExtensionType>, value: Value) -> Result<(), CodecError> {
        if xt.extendee().full_name() != self.desc.full_name() {
            return Err(CodecError::ExtendeeMismatch {
                extension: xt.full_name().to_owned(),
                message: self.desc.full_name().to_owned(),
            });
        }
        self.extensions_mut().set(xt, value);
        Ok(())
    }

    pub fn get_extension(&self, number: i32) -> Option<&Value> {
        self.extensions
            .as_ref()?
            .get(Number(number))?
            .value()
    }

    pub fn has_extension(&self, number: i32) -> bool {
        self.extensions
            .as_ref()
            .is_some_and(|store| store.has(Number(number)))
    }

    pub fn clear_extension(&mut self, number: i32) {
        if let Some(store) = self.extensions.as_mut() {
            store.clear(Number(number));
        }
    }

    /// Raw bytes of fields that were not recognized on decode, in wire order.
    pub fn unknown(&self) -> &[u8] {
        &self.unknown
    }

    /// Appends raw field bytes to the unknown tail.
    pub fn append_unknown(&mut self, raw: &[u8]) {
        self.unknown.extend_from_slice(raw);
    }

    /// Drops every extension and the unknown tail.
    pub fn reset(&mut self) {
        self.extensions = None;
        self.unknown.clear();
    }
}

impl PartialEq for Message {
    /// An absent store equals an empty one.
    fn eq(&self, other: &Self) -> bool {
        let empty = ExtensionStore::new();
        self.desc == other.desc
            && self.extensions.as_ref().unwrap_or(&empty) == other.extensions.as_ref().unwrap_or(&empty)
            && self.unknown == other.unknown
    }
}
