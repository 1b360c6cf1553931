//! Error types for the build path.

use cranea_core::Gid;
use cranea_seal::SealError;
use cranea_store::StoreError;
use thiserror::Error;

/// Errors raised while assembling or emitting a story.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Nothing to play.
    #[error("story has no locations")]
    NoLocations,

    /// The initial location has a parent.
    #[error("initial location {0} is not a root location")]
    InitialNotRoot(Gid),

    /// A start key must name an immediate child.
    #[error("start location {start} is not a child of {location}")]
    StartNotChild { location: Gid, start: Gid },

    /// An action with neither commands nor hooks can never fire.
    #[error("action {0} has no command or hook")]
    UnreachableAction(Gid),

    /// A handle from another graph.
    #[error("unknown node {0}")]
    UnknownNode(Gid),

    /// A handle pointing at a node of another kind.
    #[error("node {gid} is not a {expected}")]
    WrongKind { gid: Gid, expected: &'static str },

    /// More nodes than a gid can number.
    #[error("too many nodes")]
    TooManyNodes,

    /// The container prefix contains a NUL byte.
    #[error("container prefix contains a NUL byte")]
    NulInPrefix,

    /// Container error.
    #[error("container error: {0}")]
    Store(#[from] StoreError),

    /// Object codec error.
    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
