//! Error types for the engine.

use cranea_core::{CoreError, Gid};
use cranea_seal::SealError;
use cranea_store::StoreError;
use thiserror::Error;

/// Errors that can occur while playing a story.
///
/// A wrong-key candidate during command resolution and an unsatisfied
/// predicate are not errors; they behave like a missing command. What is
/// left signals a container that does not match its own tables, a bad
/// save file, or I/O trouble.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Container error.
    #[error("container error: {0}")]
    Store(#[from] StoreError),

    /// Object codec error.
    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    /// Core primitive error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A key that should name a location in the container does not.
    #[error("no location for key at {0}")]
    UnknownLocation(String),

    /// A location was decrypted under a gid that disagrees with the tables.
    #[error("location {0} does not match its parent's child table")]
    Mismatch(Gid),

    /// The container contradicts itself.
    #[error("corrupt container: {0}")]
    Corrupt(String),

    /// A save file that cannot be applied.
    #[error("bad save file: {0}")]
    BadSave(String),

    /// The traversal stack is empty.
    #[error("no current location")]
    NoLocation,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
