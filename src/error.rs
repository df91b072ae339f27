//! Crate-level error taxonomy.
//!
//! Most functions propagate `anyhow::Result`; the variants here exist so
//! callers can distinguish the failure classes the pipeline treats
//! differently: per-document parse failures are skipped, generation failures
//! are rendered into the answer text, and configuration or index/model
//! mismatches are fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration value (bad chunk size/overlap, unknown provider).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A required file or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The embedding model could not be loaded. Fatal at startup; never
    /// retried automatically.
    #[error("failed to initialize embedding model: {0}")]
    ModelInit(String),

    /// The language model call failed. Callers on the query path convert
    /// this into user-visible answer text instead of propagating it.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The persisted index was built under a different embedding model or
    /// dimensionality than the one now configured.
    #[error(
        "index incompatible with configured embedding model: \
         index has {stored_model} ({stored_dims} dims), \
         configured {requested_model} ({requested_dims} dims); \
         run `rag clear` and re-ingest to rebuild"
    )]
    DimensionMismatch {
        stored_model: String,
        stored_dims: usize,
        requested_model: String,
        requested_dims: usize,
    },
}
