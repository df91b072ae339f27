//! Index statistics overview.
//!
//! A quick summary of what's in the index: chunk counts, source counts, and
//! a per-source breakdown. Used by `rag stats` to give confidence that
//! ingestion is working as expected, without loading any embedding model.

use anyhow::Result;

use crate::config::Config;
use crate::store::VectorStore;

/// Run the stats command: query the index and print a summary.
pub async fn run_stats(config: &Config, store: &VectorStore) -> Result<()> {
    let stats = store.stats().await?;

    let db_size = std::fs::metadata(&config.index.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Index Stats");
    println!("===========");
    println!();
    println!("  Database:    {}", config.index.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Collection:  {}", config.index.collection);
    println!("  Model:       {} ({} dims)", store.model(), store.dims());
    println!();
    println!("  Chunks:      {}", stats.total_chunks);
    println!("  Sources:     {}", stats.num_sources());

    if !stats.sources.is_empty() {
        println!();
        println!("  By source:");
        for source in &stats.sources {
            println!("    {}", source);
        }
    }

    println!();
    Ok(())
}

/// Run the clear command: wipe the collection and report what was removed.
pub async fn run_clear(store: &VectorStore) -> Result<()> {
    let removed = store.clear_all().await?;
    println!("cleared {} chunks from the index", removed);
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
