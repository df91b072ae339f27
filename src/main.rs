//! # Ragline CLI (`rag`)
//!
//! The `rag` binary is the interface to the pipeline: ingest a directory of
//! documents into the vector index, ask questions over it, inspect what's
//! indexed, and wipe it.
//!
//! ## Usage
//!
//! ```bash
//! rag --config ./config/rag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rag ingest` | Parse, chunk, embed, and index every supported document |
//! | `rag query "<question>"` | Answer a question from the indexed documents |
//! | `rag stats` | Show chunk and source counts for the index |
//! | `rag clear` | Remove every chunk from the index |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ragline::{config, embedding, ingest, llm, query, stats, store::VectorStore};

/// Ragline CLI — a local-first RAG pipeline over your own documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/rag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "rag",
    about = "Ragline — ask questions over your own documents, locally",
    version,
    long_about = "Ragline ingests personal documents (txt, md, pdf, docx) into a SQLite-backed \
    vector index and answers questions over them by retrieving the most relevant chunks and \
    prompting a language model (Ollama or OpenAI)."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest documents into the vector index.
    ///
    /// Scans the configured documents directory, extracts text, splits it
    /// into overlapping chunks, embeds each chunk, and stores everything in
    /// SQLite. Re-running replaces previously ingested documents, so this
    /// command is idempotent.
    Ingest,

    /// Ask a question over the ingested documents.
    ///
    /// Embeds the question, retrieves the closest chunks, and sends a
    /// context-grounded prompt to the configured language model.
    Query {
        /// The question to answer.
        question: String,

        /// Number of chunks to retrieve (overrides the config value).
        #[arg(long)]
        top_k: Option<usize>,

        /// Don't append the list of source files to the answer.
        #[arg(long)]
        no_sources: bool,
    },

    /// Show what's in the index.
    ///
    /// Prints chunk and source counts plus the embedding model the index
    /// was built with. Does not load any model.
    Stats,

    /// Remove every chunk from the index.
    ///
    /// The collection's embedding-model identity is kept; re-ingest with
    /// the same configuration to repopulate.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest => {
            let embedder = embedding::create_embedder(&config.embedding).await?;
            let store = VectorStore::open(
                &config.index.path,
                &config.index.collection,
                embedder.model_name(),
                embedder.dims(),
            )
            .await?;

            ingest::run_ingest(&config, &store, embedder.as_ref()).await?;
            store.close().await;
        }
        Commands::Query {
            question,
            top_k,
            no_sources,
        } => {
            let embedder = embedding::create_embedder(&config.embedding).await?;
            let generator = llm::create_generator(&config.llm)?;
            let store = VectorStore::open(
                &config.index.path,
                &config.index.collection,
                embedder.model_name(),
                embedder.dims(),
            )
            .await?;

            query::run_query(
                &store,
                embedder.as_ref(),
                generator.as_ref(),
                &question,
                top_k.unwrap_or(config.retrieval.top_k),
                !no_sources,
            )
            .await?;
            store.close().await;
        }
        Commands::Stats => {
            // Resolve the model identity from config alone; stats never
            // needs the model loaded.
            let (model, dims) = embedding::embedding_identity(&config.embedding)?;
            let store =
                VectorStore::open(&config.index.path, &config.index.collection, &model, dims)
                    .await?;

            stats::run_stats(&config, &store).await?;
            store.close().await;
        }
        Commands::Clear => {
            let (model, dims) = embedding::embedding_identity(&config.embedding)?;
            let store =
                VectorStore::open(&config.index.path, &config.index.collection, &model, dims)
                    .await?;

            stats::run_clear(&store).await?;
            store.close().await;
        }
    }

    Ok(())
}
