//! Wire parsing error type.

use thiserror::Error;

/// Error type for wire-format parsing operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("variable length integer overflow")]
    VarintOverflow,
    #[error("invalid field number")]
    InvalidFieldNumber,
    #[error("invalid wire type {0}")]
    InvalidWireType(u8),
    #[error("mismatching end group marker")]
    EndGroupMismatch,
    #[error("exceeded maximum recursion depth")]
    RecursionLimit,
}
