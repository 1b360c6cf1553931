//! Error types for the facade.

use cranea_build::BuildError;
use cranea_core::CoreError;
use cranea_engine::EngineError;
use cranea_seal::SealError;
use cranea_store::StoreError;
use thiserror::Error;

/// Errors from any layer.
#[derive(Debug, Error)]
pub enum CraneaError {
    /// Core primitive error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Object codec error.
    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    /// Container error.
    #[error("container error: {0}")]
    Store(#[from] StoreError),

    /// Story could not be built.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// Error while playing.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, CraneaError>;
