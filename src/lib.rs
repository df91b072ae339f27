//! # Ragline
//!
//! A local-first retrieval-augmented generation (RAG) pipeline for personal
//! documents.
//!
//! Ragline ingests documents from a directory (plain text, Markdown, PDF,
//! DOCX), splits them into overlapping chunks, embeds each chunk, and stores
//! text + vectors in a durable SQLite index. Questions are answered by
//! embedding the query, retrieving the nearest chunks, and handing a
//! context-grounded prompt to a language model (Ollama or OpenAI).
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────┐   ┌──────────┐
//! │ Documents │──▶│ Parse → Chunk →  │──▶│  SQLite   │
//! │ txt/md/   │   │ Embed            │   │  vectors  │
//! │ pdf/docx  │   └──────────────────┘   └────┬─────┘
//! └───────────┘                               │
//!                 ┌──────────────────┐        │
//!    question ───▶│ Embed → Retrieve │◀───────┘
//!                 │ → Prompt → LLM   │
//!                 └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rag ingest                    # index everything under data/documents
//! rag query "Where did Alice study?"
//! rag stats                     # what's in the index
//! rag clear                     # wipe the index
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`parse`] | Text extraction per document format |
//! | [`discover`] | Document discovery under the configured root |
//! | [`chunk`] | Text segmentation with overlap |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Durable vector index over SQLite |
//! | [`ingest`] | Ingestion pipeline orchestration |
//! | [`llm`] | Language-model generation clients |
//! | [`query`] | Retrieval + prompt assembly + answering |
//! | [`stats`] | Index statistics reporting |
//! | [`db`] | Database connection |

pub mod chunk;
pub mod config;
pub mod db;
pub mod discover;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod parse;
pub mod query;
pub mod stats;
pub mod store;

pub use error::RagError;
