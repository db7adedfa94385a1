//! Capability flags consulted by the codec.

/// Process-level capabilities.
///
/// The codec only reads these; they reach it through [`crate::MarshalOptions`]
/// and [`crate::UnmarshalOptions`] rather than through global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    /// Legacy wire conventions (message sets) are supported.
    pub proto_legacy: bool,
}

impl Flags {
    pub const LEGACY: Flags = Flags { proto_legacy: true };
    pub const MODERN: Flags = Flags {
        proto_legacy: false,
    };
}

impl Default for Flags {
    /// Follows the `legacy` cargo feature.
    fn default() -> Self {
        Self {
            proto_legacy: cfg!(feature = "legacy"),
        }
    }
}
