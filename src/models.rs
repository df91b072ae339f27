//! Core data types used throughout Ragline.
//!
//! These types represent the chunks, metadata records, and results that flow
//! through the ingestion and retrieval pipeline.

use anyhow::Result;
use serde::Serialize;

use crate::error::RagError;

/// Metadata attached to every stored chunk.
///
/// A fixed, validated record rather than a free-form map: `chunk_index` must
/// lie in `0..total_chunks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    /// Canonical path of the source document.
    pub source: String,
    /// File name component of the source, used as the display label.
    pub filename: String,
    /// Position of this chunk within its document.
    pub chunk_index: i64,
    /// Number of chunks the document was split into.
    pub total_chunks: i64,
}

impl ChunkMetadata {
    pub fn new(source: &str, filename: &str, chunk_index: i64, total_chunks: i64) -> Result<Self> {
        if total_chunks < 1 || chunk_index < 0 || chunk_index >= total_chunks {
            return Err(RagError::Config(format!(
                "chunk index {} out of range for {} chunks",
                chunk_index, total_chunks
            ))
            .into());
        }
        Ok(Self {
            source: source.to_string(),
            filename: filename.to_string(),
            chunk_index,
            total_chunks,
        })
    }
}

/// A single nearest-neighbor match returned by [`VectorStore::query`].
///
/// Results are ordered by ascending `distance` (lower = more similar).
///
/// [`VectorStore::query`]: crate::store::VectorStore::query
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Live aggregate view of the index, derived by scanning current rows.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    /// Total stored chunks.
    pub total_chunks: i64,
    /// Distinct source paths, sorted.
    pub sources: Vec<String>,
}

impl IndexStats {
    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }
}

/// Aggregate counts reported after an ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub documents_found: usize,
    pub documents_processed: usize,
    pub total_chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_accepts_valid_index() {
        let meta = ChunkMetadata::new("/docs/resume.pdf", "resume.pdf", 0, 3).unwrap();
        assert_eq!(meta.chunk_index, 0);
        assert_eq!(meta.total_chunks, 3);
    }

    #[test]
    fn metadata_rejects_index_out_of_range() {
        assert!(ChunkMetadata::new("a", "a", 3, 3).is_err());
        assert!(ChunkMetadata::new("a", "a", -1, 3).is_err());
        assert!(ChunkMetadata::new("a", "a", 0, 0).is_err());
    }
}
