//! Knowledge store
//!
//! Persists knowledge sources and their embedded chunks, exposes the
//! similarity-search operator used by retrieval, and holds the single
//! originality policy record.

pub mod database;

use crate::error::Result;
use crate::originality::OriginalityPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use database::{Database, DbPool, DbStats};

/// An ingested reference document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSource {
    pub id: String,
    pub title: String,
    pub origin_url: Option<String>,
    pub license_note: Option<String>,
    /// BLAKE3 hash of the document text
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Source fields supplied at ingestion time
#[derive(Debug, Clone)]
pub struct NewSource {
    pub title: String,
    pub origin_url: Option<String>,
    pub license_note: Option<String>,
    pub content_hash: String,
}

/// A chunk ready to be written; its ordinal is its position in the batch
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A stored chunk
#[derive(Debug, Clone)]
pub struct KnowledgeChunk {
    pub id: i64,
    pub source_id: String,
    /// Position within the source; kept for traceability only
    pub ordinal: usize,
    pub content: String,
    pub embedding: Vec<f32>,
    pub embedding_model: String,
}

/// A chunk with its similarity to a query vector
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub score: f32,
}

/// Storage contract consumed by ingestion, retrieval and the policy lookup
pub trait KnowledgeStore: Send + Sync {
    /// Chunks scoring at least `min_similarity`, best first, at most `k`
    fn similarity_search(
        &self,
        query_vector: &[f32],
        k: usize,
        min_similarity: f32,
    ) -> Result<Vec<ScoredChunk>>;

    /// Distinct embedding models that produced the stored vectors
    fn embedding_models(&self) -> Result<Vec<String>>;

    /// Write a source and all of its chunks atomically
    fn insert_source(
        &self,
        source: &NewSource,
        chunks: &[NewChunk],
        embedding_model: &str,
    ) -> Result<KnowledgeSource>;

    fn find_source_by_hash(&self, content_hash: &str) -> Result<Option<KnowledgeSource>>;

    fn list_sources(&self) -> Result<Vec<KnowledgeSource>>;

    /// Delete a source and, by cascade, its chunks
    fn delete_source(&self, id: &str) -> Result<()>;

    fn chunk_count(&self, source_id: &str) -> Result<usize>;

    /// The stored policy record, if an administrator has written one
    fn load_policy(&self) -> Result<Option<OriginalityPolicy>>;

    fn save_policy(&self, policy: &OriginalityPolicy) -> Result<()>;
}
