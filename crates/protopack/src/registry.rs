//! Extension type lookup.

use std::collections::HashMap;
use std::sync::Arc;

use protopack_wire::Number;
use thiserror::Error;

use crate::ExtensionType;

/// Finds extension types by extendee and field number during decode.
pub trait ExtensionResolver: Send + Sync {
    fn find_extension_by_number(&self, extendee: &str, number: Number)
        -> Option<Arc<ExtensionType>>;
}

/// Knows no extensions; every extension field decodes as unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResolver;

impl ExtensionResolver for EmptyResolver {
    fn find_extension_by_number(&self, _: &str, _: Number) -> Option<Arc<ExtensionType>> {
        None
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("extension {number} of {extendee} is already registered")]
    Duplicate { extendee: String, number: i32 },
    #[error("invalid extension field number {0}")]
    InvalidNumber(i32),
    #[error("extension {name} extends a message set but is not a singular message")]
    MessageSetRequiresMessage { name: String },
}

/// In-memory resolver filled by [`ExtensionRegistry::register`].
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    by_extendee: HashMap<String, HashMap<Number, Arc<ExtensionType>>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `xt` and returns the shared handle stored for it.
    pub fn register(&mut self, xt: ExtensionType) -> Result<Arc<ExtensionType>, RegistryError> {
        let number = xt.number();
        if !number.is_valid() {
            return Err(RegistryError::InvalidNumber(number.get()));
        }
        if xt.extendee().is_message_set() && !xt.fits_message_set() {
            return Err(RegistryError::MessageSetRequiresMessage {
                name: xt.full_name().to_owned(),
            });
        }
        let extendee = xt.extendee().full_name().to_owned();
        let slot = self.by_extendee.entry(extendee.clone()).or_default();
        if slot.contains_key(&number) {
            return Err(RegistryError::Duplicate {
                extendee,
                number: number.get(),
            });
        }
        let xt = Arc::new(xt);
        slot.insert(number, xt.clone());
        Ok(xt)
    }

    pub fn len(&self) -> usize {
        self.by_extendee.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExtensionResolver for ExtensionRegistry {
    fn find_extension_by_number(
        &self,
        extendee: &str,
        number: Number,
    ) -> Option<Arc<ExtensionType>> {
        self.by_extendee.get(extendee)?.get(&number).cloned()
    }
}
