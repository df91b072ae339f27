use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::RagError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// SQLite database file backing the vector index.
    pub path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    "personal_documents".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    /// Directory scanned for documents to ingest.
    #[serde(default = "default_documents_root")]
    pub root: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: default_documents_root(),
        }
    }
}

fn default_documents_root() -> PathBuf {
    PathBuf::from("data/documents")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in bytes (splits never land inside a UTF-8
    /// sequence).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Bytes re-included from the tail of the previous chunk.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `local`, `ollama`, or `openai`.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// `ollama` or `openai`.
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Base URL for the ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            url: None,
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_llm_provider() -> String {
    "ollama".to_string()
}
fn default_llm_model() -> String {
    "llama3.2".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    120
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(RagError::NotFound(format!(
            "config file {} (copy config/rag.example.toml to get started)",
            path.display()
        ))
        .into());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        return Err(RagError::Config("chunking.chunk_size must be > 0".to_string()).into());
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        return Err(RagError::Config(format!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap, config.chunking.chunk_size
        ))
        .into());
    }
    if config.retrieval.top_k == 0 {
        return Err(RagError::Config("retrieval.top_k must be >= 1".to_string()).into());
    }

    match config.embedding.provider.as_str() {
        "local" | "ollama" | "openai" => {}
        other => {
            return Err(RagError::Config(format!(
                "unknown embedding provider '{}'; must be local, ollama, or openai",
                other
            ))
            .into())
        }
    }

    // Remote providers cannot infer the vector dimensionality.
    if config.embedding.provider != "local"
        && (config.embedding.model.is_none() || config.embedding.dims.is_none())
    {
        return Err(RagError::Config(format!(
            "embedding.model and embedding.dims are required when provider is '{}'",
            config.embedding.provider
        ))
        .into());
    }

    match config.llm.provider.as_str() {
        "ollama" | "openai" => Ok(()),
        other => Err(RagError::Config(format!(
            "unknown llm provider '{}'; must be ollama or openai",
            other
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(chunking: &str) -> Config {
        let toml_str = format!(
            r#"
[index]
path = "data/rag.sqlite"
{}
"#,
            chunking
        );
        toml::from_str(&toml_str).unwrap()
    }

    #[test]
    fn defaults_match_documented_settings() {
        let config = base_config("");
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.index.collection, "personal_documents");
        assert_eq!(config.embedding.provider, "local");
        assert_eq!(config.llm.provider, "ollama");
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let config = base_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn remote_embedding_requires_model_and_dims() {
        let config = base_config("[embedding]\nprovider = \"ollama\"");
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_provider_rejected() {
        let config = base_config("[embedding]\nprovider = \"sbert\"");
        assert!(validate(&config).is_err());
    }
}
