//! Error types for Cranea Core.

use thiserror::Error;

/// Errors raised by the pure primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An action kind code outside the known range.
    #[error("unknown action kind: {0}")]
    UnknownActionKind(u32),

    /// A hex string did not describe a value of the expected width.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
