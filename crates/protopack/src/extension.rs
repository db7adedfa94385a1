//! Extension field store.
//!
//! Holds the field set that is not part of a message's static schema,
//! keyed by field number.

use std::collections::HashMap;
use std::sync::Arc;

use protopack_wire::Number;

use crate::{CodecError, ExtensionType, Value};

/// One extension entry: its type descriptor and current value.
#[derive(Debug, Clone)]
pub struct ExtensionField {
    xt: Arc<ExtensionType>,
    value: Option<Value>,
}

impl ExtensionField {
    pub fn new(xt: Arc<ExtensionType>) -> Self {
        Self { xt, value: None }
    }

    pub fn extension_type(&self) -> &Arc<ExtensionType> {
        &self.xt
    }

    /// `None` until a value has been set or decoded.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }

    pub(crate) fn take_value(&mut self) -> Option<Value> {
        self.value.take()
    }
}

impl PartialEq for ExtensionField {
    fn eq(&self, other: &Self) -> bool {
        self.xt.number() == other.xt.number()
            && self.xt.full_name() == other.xt.full_name()
            && self.value == other.value
    }
}

/// Extension fields of one message, keyed by field number.
///
/// Iteration order is unspecified. [`ExtensionStore::iter`] permutes entries
/// with the build-seeded shuffle so that no caller comes to rely on it; use
/// [`ExtensionStore::numbers_sorted`] when an order matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionStore {
    fields: HashMap<Number, ExtensionField>,
}

impl ExtensionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `xt`, creating an empty one bound to it if absent.
    pub fn get_or_create(&mut self, xt: &Arc<ExtensionType>) -> &mut ExtensionField {
        self.fields
            .entry(xt.number())
            .or_insert_with(|| ExtensionField::new(xt.clone()))
    }

    pub fn get(&self, number: Number) -> Option<&ExtensionField> {
        self.fields.get(&number)
    }

    pub fn get_mut(&mut self, number: Number) -> Option<&mut ExtensionField> {
        self.fields.get_mut(&number)
    }

    /// Reports whether a value is present for `number`.
    pub fn has(&self, number: Number) -> bool {
        self.fields
            .get(&number)
            .is_some_and(|field| field.value.is_some())
    }

    /// Sets the value of `xt`, replacing any previous one.
    pub fn set(&mut self, xt: &Arc<ExtensionType>, value: Value) {
        self.get_or_create(xt).set_value(value);
    }

    pub fn clear(&mut self, number: Number) -> Option<ExtensionField> {
        self.fields.remove(&number)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Entries in a build-stable but otherwise unspecified order.
    pub fn iter(&self) -> std::vec::IntoIter<(Number, &ExtensionField)> {
        let mut entries: Vec<(Number, &ExtensionField)> =
            self.fields.iter().map(|(&num, field)| (num, field)).collect();
        entries.sort_unstable_by_key(|&(num, _)| num);
        protopack_detrand::shuffle(&mut entries);
        entries.into_iter()
    }

    /// Entries in hash-map order, for uses where order does not matter.
    pub(crate) fn fields(&self) -> impl Iterator<Item = &ExtensionField> {
        self.fields.values()
    }

    pub fn numbers_sorted(&self) -> Vec<Number> {
        let mut numbers: Vec<Number> = self.fields.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }
}

/// Visits every field in the order used on the wire.
///
/// | entries | order |
/// |---|---|
/// | 0 | nothing visited |
/// | 1 | the single entry |
/// | 2+ | ascending field number |
pub(crate) fn for_each_in_wire_order<F>(store: &ExtensionStore, mut f: F) -> Result<(), CodecError>
where
    F: FnMut(&ExtensionField) -> Result<(), CodecError>,
{
    match store.len() {
        0 => Ok(()),
        1 => store.fields().try_for_each(f),
        _ => store
            .numbers_sorted()
            .into_iter()
            .filter_map(|num| store.get(num))
            .try_for_each(f),
    }
}
