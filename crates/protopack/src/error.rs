//! Codec error type.

use protopack_wire::WireError;
use thiserror::Error;

use crate::messageset::MessageSetError;

/// Terminal error of a size/marshal/unmarshal call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("no support for message_set_wire_format")]
    UnsupportedEncoding,
    #[error("malformed wire data: {0}")]
    MalformedWire(#[from] WireError),
    #[error("message set: {0}")]
    MessageSet(#[from] MessageSetError),
    #[error("extension {number}: value does not match declared kind {expected}")]
    ValueMismatch { number: i32, expected: &'static str },
    #[error("extension {number}: string contains invalid UTF-8")]
    InvalidUtf8 { number: i32 },
    #[error("extension {extension} does not extend {message}")]
    ExtendeeMismatch { extension: String, message: String },
}

impl CodecError {
    /// Reports whether the error stems from input bytes that do not parse.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            CodecError::MalformedWire(_) | CodecError::MessageSet(_) | CodecError::InvalidUtf8 { .. }
        )
    }
}
