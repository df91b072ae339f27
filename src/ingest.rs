//! Ingestion pipeline orchestration.
//!
//! Per document: parse → segment → batch-embed → replace in the index.
//! Replacement is delete-then-insert for the document's source path, which
//! makes re-ingestion idempotent: the index ends up reflecting only the
//! latest content, with deterministic `{stem}_{index}` chunk ids.
//!
//! Parse failures and empty extractions are logged and skipped so one bad
//! file never aborts the rest of the batch. Embedding and index-mutation
//! errors propagate; a failed durability write is never swallowed.

use anyhow::Result;
use std::path::Path;

use crate::chunk;
use crate::config::Config;
use crate::discover;
use crate::embedding::Embedder;
use crate::models::{ChunkMetadata, IngestReport};
use crate::parse;
use crate::store::VectorStore;

/// Ingest one document, replacing any chunks previously stored for it.
///
/// Returns the number of chunks stored: `Ok(0)` covers both the skip cases
/// (unparseable file, empty extraction) and genuinely empty documents.
pub async fn ingest_document(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
    path: &Path,
) -> Result<usize> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let text = match parse::parse_document(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("  skipping {}: {}", filename, e);
            return Ok(0);
        }
    };

    if text.trim().is_empty() {
        eprintln!("  skipping {}: no text extracted", filename);
        return Ok(0);
    }

    let chunks = chunk::split_text(
        &text,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    )?;

    if chunks.is_empty() {
        return Ok(0);
    }

    let vectors = embedder.embed_batch(&chunks).await?;

    let source = path.display().to_string();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.clone());
    let total = chunks.len() as i64;

    let mut ids = Vec::with_capacity(chunks.len());
    let mut metadatas = Vec::with_capacity(chunks.len());
    for i in 0..chunks.len() {
        ids.push(format!("{}_{}", stem, i));
        metadatas.push(ChunkMetadata::new(&source, &filename, i as i64, total)?);
    }

    // Wholesale replace: drop whatever this source had before, then insert
    // the new set. Not transactionally isolated across the two calls; the
    // recovery path for a crash in between is simply re-running ingestion.
    store.delete_by_source(&source).await?;
    store.add(&ids, &chunks, &vectors, &metadatas).await?;

    Ok(chunks.len())
}

/// Ingest every supported document under the configured root.
pub async fn ingest_all(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
) -> Result<IngestReport> {
    let documents = discover::find_documents(&config.documents.root)?;

    let mut report = IngestReport {
        documents_found: documents.len(),
        ..IngestReport::default()
    };

    for path in &documents {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        println!("processing {}", filename);

        let stored = ingest_document(config, store, embedder, path).await?;
        if stored > 0 {
            println!("  stored {} chunks", stored);
            report.documents_processed += 1;
            report.total_chunks += stored;
        }
    }

    Ok(report)
}

/// CLI wrapper: run a full ingestion and print the summary block.
pub async fn run_ingest(
    config: &Config,
    store: &VectorStore,
    embedder: &dyn Embedder,
) -> Result<()> {
    println!(
        "ingesting from {} (model: {})",
        config.documents.root.display(),
        embedder.model_name()
    );

    let report = ingest_all(config, store, embedder).await?;

    if report.documents_found == 0 {
        println!(
            "no documents found in {} (supported: {})",
            config.documents.root.display(),
            parse::SUPPORTED_EXTENSIONS.join(", ")
        );
        return Ok(());
    }

    let stats = store.stats().await?;

    println!();
    println!("ingestion complete");
    println!("  documents found:     {}", report.documents_found);
    println!("  documents processed: {}", report.documents_processed);
    println!("  chunks stored:       {}", report.total_chunks);
    println!(
        "  index now holds {} chunks from {} sources",
        stats.total_chunks,
        stats.num_sources()
    );

    Ok(())
}
