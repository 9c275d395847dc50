//! Error types for the input loader
//!
//! All fatal conditions unwind through `initialize()` / `next_quads()`
//! to the caller; the loader attempts `close()` internally before
//! propagating, so callers never need to double-close to reclaim disk
//! space. Temp-file deletion failures during cleanup are logged and
//! swallowed rather than surfaced here.

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Pipeline stage identifiers used to tag temp-file errors
pub mod stage {
    /// Writing spill files during preprocessing
    pub const PREPROCESS: &str = "preprocess";
    /// Partitioning input into sorted chunks
    pub const CHUNK_SORT: &str = "chunk-sort";
    /// K-way merging sorted chunks
    pub const MERGE: &str = "merge";
    /// Joining the secondary index against the primary stream
    pub const SECONDARY_JOIN: &str = "secondary-join";
    /// Reading the sorted cursor during iteration
    pub const CURSOR: &str = "cursor";
}

/// Loader errors
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A statement source failed mid-stream
    #[error("source '{source_name}' failed: {message}")]
    Source {
        /// Identity of the failing source
        source_name: String,
        /// Upstream failure description
        message: String,
    },

    /// Temporary-file I/O failure, tagged with the pipeline stage
    #[error("temp file I/O during {stage}: {source}")]
    TempFile {
        /// One of the [`stage`] identifiers
        stage: &'static str,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A spill-file record failed to decode (writer/reader arity
    /// disagreement or corrupt term token)
    #[error("spill record error: {0}")]
    Model(#[from] graphfuse_ir::Error),

    /// API misuse: an operation was invoked in the wrong loader state.
    /// A programming error, distinct from data errors; never retried.
    #[error("illegal loader state: {0}")]
    IllegalState(&'static str),
}

impl LoaderError {
    /// Wrap an I/O error with its pipeline stage
    pub fn temp(stage: &'static str, source: std::io::Error) -> Self {
        LoaderError::TempFile { stage, source }
    }

    /// Create a source error
    pub fn source_failed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        LoaderError::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
