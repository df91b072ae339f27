//! Durable vector index over SQLite.
//!
//! [`VectorStore`] maps chunk ids to `(text, vector, metadata)` rows. Every
//! mutating call commits before returning; there is no buffered-write layer
//! to lose on a crash. Nearest-neighbor queries scan the collection and rank
//! by [`cosine_distance`] in Rust, which is plenty for a personal-scale
//! corpus and keeps the schema plain.
//!
//! The collection row records the embedding model identity `(model, dims)`
//! at creation. Reopening with a different model is refused outright rather
//! than silently returning wrong-metric rankings.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::embedding::{blob_to_vec, cosine_distance, vec_to_blob};
use crate::error::RagError;
use crate::models::{ChunkMetadata, IndexStats, SearchHit};

/// Optional equality filter applied before ranking.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Restrict candidates to this source path.
    pub source: Option<String>,
}

/// Durable store of embedded chunks for one collection and one embedding
/// model.
#[derive(Debug)]
pub struct VectorStore {
    pool: SqlitePool,
    collection: String,
    model: String,
    dims: usize,
}

impl VectorStore {
    /// Open (or create) the collection at `db_path`.
    ///
    /// Creates the schema if missing and registers the collection under the
    /// given `(model, dims)` identity on first open. On reopen the stored
    /// identity must match exactly, otherwise this fails with
    /// [`RagError::DimensionMismatch`].
    pub async fn open(db_path: &Path, collection: &str, model: &str, dims: usize) -> Result<Self> {
        let pool = crate::db::connect(db_path).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                embedding_model TEXT NOT NULL,
                dims INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT NOT NULL,
                collection TEXT NOT NULL,
                source TEXT NOT NULL,
                filename TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                total_chunks INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id),
                FOREIGN KEY (collection) REFERENCES collections(name)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(collection, source)")
            .execute(&pool)
            .await?;

        let existing = sqlx::query("SELECT embedding_model, dims FROM collections WHERE name = ?")
            .bind(collection)
            .fetch_optional(&pool)
            .await?;

        match existing {
            Some(row) => {
                let stored_model: String = row.get("embedding_model");
                let stored_dims: i64 = row.get("dims");
                if stored_model != model || stored_dims as usize != dims {
                    pool.close().await;
                    return Err(RagError::DimensionMismatch {
                        stored_model,
                        stored_dims: stored_dims as usize,
                        requested_model: model.to_string(),
                        requested_dims: dims,
                    }
                    .into());
                }
            }
            None => {
                sqlx::query(
                    "INSERT INTO collections (name, embedding_model, dims, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(collection)
                .bind(model)
                .bind(dims as i64)
                .bind(chrono::Utc::now().timestamp())
                .execute(&pool)
                .await?;
            }
        }

        Ok(Self {
            pool,
            collection: collection.to_string(),
            model: model.to_string(),
            dims,
        })
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Store chunks with their embeddings and metadata.
    ///
    /// All four slices must be equal length. Re-adding an id that already
    /// exists in this collection overwrites it (last write wins); the same
    /// id in another collection is a distinct row. The whole batch commits
    /// in one transaction, so it is durable before this returns.
    pub async fn add(
        &self,
        ids: &[String],
        texts: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[ChunkMetadata],
    ) -> Result<()> {
        if ids.len() != texts.len() || ids.len() != vectors.len() || ids.len() != metadatas.len() {
            return Err(RagError::Config(format!(
                "add requires equal-length inputs: {} ids, {} texts, {} vectors, {} metadatas",
                ids.len(),
                texts.len(),
                vectors.len(),
                metadatas.len()
            ))
            .into());
        }

        for vector in vectors {
            if vector.len() != self.dims {
                return Err(RagError::DimensionMismatch {
                    stored_model: self.model.clone(),
                    stored_dims: self.dims,
                    requested_model: self.model.clone(),
                    requested_dims: vector.len(),
                }
                .into());
            }
        }

        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for i in 0..ids.len() {
            let meta = &metadatas[i];
            sqlx::query(
                r#"
                INSERT INTO chunks (id, collection, source, filename, chunk_index, total_chunks, text, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    source = excluded.source,
                    filename = excluded.filename,
                    chunk_index = excluded.chunk_index,
                    total_chunks = excluded.total_chunks,
                    text = excluded.text,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&ids[i])
            .bind(&self.collection)
            .bind(&meta.source)
            .bind(&meta.filename)
            .bind(meta.chunk_index)
            .bind(meta.total_chunks)
            .bind(&texts[i])
            .bind(vec_to_blob(&vectors[i]))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Return up to `top_k` entries nearest to `vector`, ascending by cosine
    /// distance (ties broken by id for determinism).
    ///
    /// A `top_k` exceeding the number of stored entries returns everything;
    /// an empty index returns an empty vec. Neither is an error.
    pub async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<SearchHit>> {
        if vector.len() != self.dims {
            return Err(RagError::DimensionMismatch {
                stored_model: self.model.clone(),
                stored_dims: self.dims,
                requested_model: self.model.clone(),
                requested_dims: vector.len(),
            }
            .into());
        }

        let source_filter = filter.and_then(|f| f.source.clone());

        let rows = match &source_filter {
            Some(source) => {
                sqlx::query(
                    "SELECT id, source, filename, chunk_index, total_chunks, text, embedding \
                     FROM chunks WHERE collection = ? AND source = ?",
                )
                .bind(&self.collection)
                .bind(source)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, source, filename, chunk_index, total_chunks, text, embedding \
                     FROM chunks WHERE collection = ?",
                )
                .bind(&self.collection)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut hits: Vec<SearchHit> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let stored = blob_to_vec(&blob);
                SearchHit {
                    id: row.get("id"),
                    text: row.get("text"),
                    metadata: ChunkMetadata {
                        source: row.get("source"),
                        filename: row.get("filename"),
                        chunk_index: row.get("chunk_index"),
                        total_chunks: row.get("total_chunks"),
                    },
                    distance: cosine_distance(vector, &stored),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);

        Ok(hits)
    }

    /// Delete every chunk belonging to `source`. Returns the number of rows
    /// removed; a source with no chunks (including one never ingested) is a
    /// no-op reporting zero.
    pub async fn delete_by_source(&self, source: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE collection = ? AND source = ?")
            .bind(&self.collection)
            .bind(source)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Irreversibly remove every chunk in the collection.
    pub async fn clear_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE collection = ?")
            .bind(&self.collection)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Aggregate view derived live from current rows, never from counters.
    pub async fn stats(&self) -> Result<IndexStats> {
        let total_chunks: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE collection = ?")
                .bind(&self.collection)
                .fetch_one(&self.pool)
                .await?;

        let sources: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT source FROM chunks WHERE collection = ? ORDER BY source",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(IndexStats {
            total_chunks,
            sources,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
