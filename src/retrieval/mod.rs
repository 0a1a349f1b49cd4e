//! Reference retrieval
//!
//! Embeds a generation request and pulls the closest knowledge chunks, the
//! set of references a draft must stay original against.

mod retriever;

pub use retriever::Retriever;

use crate::storage::ScoredChunk;
use serde::Serialize;

/// A knowledge chunk handed to the verifier
///
/// Carries no ordinal; chunk position stays inside the store.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceChunk {
    pub chunk_id: i64,
    pub source_id: String,
    pub content: String,
    /// Stored vector; `None` makes the verifier re-embed `content`
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    /// Similarity to the request query
    pub score: f32,
}

impl From<ScoredChunk> for ReferenceChunk {
    fn from(scored: ScoredChunk) -> Self {
        Self {
            chunk_id: scored.chunk.id,
            source_id: scored.chunk.source_id,
            content: scored.chunk.content,
            embedding: Some(scored.chunk.embedding),
            score: scored.score,
        }
    }
}
