//! Error types for the object codec.

use cranea_core::CoreError;
use thiserror::Error;

/// Errors raised while sealing or opening an object.
#[derive(Debug, Error)]
pub enum SealError {
    /// The decrypted magic tag did not match: wrong key or corrupt data.
    #[error("magic tag mismatch")]
    BadMagic,

    /// The source ran out before a field was complete.
    #[error("truncated object: {0} more bytes expected")]
    Truncated(usize),

    /// A length does not fit the wire's 32-bit length prefix.
    #[error("field too long: {0} bytes")]
    TooLong(usize),

    /// A string field was not UTF-8.
    #[error("string field is not valid utf-8")]
    InvalidString,

    /// A boolean field held something other than 0 or 1.
    #[error("invalid flag byte: {0}")]
    InvalidFlag(u8),

    /// A decoded field failed core validation.
    #[error("invalid field: {0}")]
    Core(#[from] CoreError),

    /// I/O error on the backing stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SealError {
    /// Whether this error means "not decryptable with this key" rather than
    /// a structural problem.
    pub fn is_wrong_key(&self) -> bool {
        matches!(self, SealError::BadMagic)
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, SealError>;
