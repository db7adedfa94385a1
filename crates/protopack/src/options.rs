//! Marshal and unmarshal options.

use std::fmt;

use protopack_wire::{WireError, DEFAULT_RECURSION_LIMIT};

use crate::registry::{EmptyResolver, ExtensionResolver};
use crate::{codec, CodecError, Flags, Message};

static EMPTY_RESOLVER: EmptyResolver = EmptyResolver;

/// Options for [`codec::size`] and [`codec::marshal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarshalOptions {
    pub flags: Flags,
}

impl MarshalOptions {
    pub fn size(self, m: &Message) -> usize {
        codec::size(m, self)
    }

    /// Encodes `m` into a fresh buffer.
    pub fn marshal(self, m: &Message) -> Result<Vec<u8>, CodecError> {
        let mut b = Vec::with_capacity(codec::size(m, self));
        codec::marshal(&mut b, m, self)?;
        Ok(b)
    }
}

/// Options for [`codec::unmarshal`].
#[derive(Clone, Copy)]
pub struct UnmarshalOptions<'a> {
    pub flags: Flags,
    /// Drop unrecognized fields instead of keeping them in the unknown tail.
    pub discard_unknown: bool,
    /// Treat malformed message-set items as fatal. When off, the malformed
    /// remainder is kept as unknown bytes.
    pub strict_message_set: bool,
    /// Where extension types are looked up by field number.
    pub resolver: &'a dyn ExtensionResolver,
    /// Remaining nesting depth for message-typed extensions.
    pub recursion_limit: usize,
}

impl Default for UnmarshalOptions<'_> {
    fn default() -> Self {
        Self {
            flags: Flags::default(),
            discard_unknown: false,
            strict_message_set: true,
            resolver: &EMPTY_RESOLVER,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl fmt::Debug for UnmarshalOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnmarshalOptions")
            .field("flags", &self.flags)
            .field("discard_unknown", &self.discard_unknown)
            .field("strict_message_set", &self.strict_message_set)
            .field("recursion_limit", &self.recursion_limit)
            .finish_non_exhaustive()
    }
}

impl<'a> UnmarshalOptions<'a> {
    pub fn with_resolver(resolver: &'a dyn ExtensionResolver) -> Self {
        Self {
            resolver,
            ..Default::default()
        }
    }

    /// Decodes `b` and merges the result into `m`.
    pub fn unmarshal(&self, b: &[u8], m: &mut Message) -> Result<usize, CodecError> {
        codec::unmarshal(b, m, self)
    }

    /// Options for decoding one nesting level deeper.
    pub(crate) fn descend(&self) -> Result<Self, CodecError> {
        if self.recursion_limit == 0 {
            return Err(WireError::RecursionLimit.into());
        }
        Ok(Self {
            recursion_limit: self.recursion_limit - 1,
            ..*self
        })
    }
}
