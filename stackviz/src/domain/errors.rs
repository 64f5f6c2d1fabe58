//! Structured error types for stackviz
//!
//! Using thiserror for automatic Display implementation and error chaining.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("Invalid datagram length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Failed to start symbolication worker `{program}`")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Symbolication worker exited ({0})")]
    WorkerExited(String),

    #[error("Symbolication worker closed its output stream")]
    WorkerClosed,

    #[error("Failed to load debug info: {0}")]
    DebugInfoLoadFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
