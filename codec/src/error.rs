//! Error types for codec operations

use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("unexpected tag: expected 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag { expected: u8, found: u8 },
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("non-canonical encoding of {0}")]
    NonCanonical(&'static str),
    #[error("integer overflow in {0}")]
    IntegerOverflow(&'static str),
    #[error("invalid string")]
    InvalidString,
    #[error("invalid data in {0}: {1}")]
    InvalidData(&'static str, &'static str), // context, message
}
