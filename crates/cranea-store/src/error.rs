//! Error types for the container.

use cranea_core::Gid;
use cranea_seal::SealError;
use thiserror::Error;

/// Errors that can occur reading or writing a container.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object codec error.
    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    /// The prefix would end early at an embedded NUL.
    #[error("container prefix contains a NUL byte")]
    NulInPrefix,

    /// An object was emitted twice.
    #[error("object {0} already written")]
    DuplicateGid(Gid),

    /// No offset-table entry for this gid.
    #[error("unknown object {0}")]
    UnknownGid(Gid),

    /// Header or table does not describe a well-formed container.
    #[error("corrupt container: {0}")]
    Corrupt(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, StoreError>;
