use super::ReferenceChunk;
use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{HuntError, Result};
use crate::generation::GenerationRequest;
use crate::storage::KnowledgeStore;
use std::sync::Arc;
use tracing::debug;

/// Fetches reference chunks for a request; read-only over the store
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn KnowledgeStore>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn KnowledgeStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Query text for a request: mechanic, theme and scene identifier
    pub fn query_text(request: &GenerationRequest) -> String {
        format!("{} {} {}", request.mechanic, request.theme, request.scene)
    }

    /// References for a generation request, possibly none
    pub async fn retrieve(&self, request: &GenerationRequest) -> Result<Vec<ReferenceChunk>> {
        self.search(&Self::query_text(request)).await
    }

    /// Top-k chunks for free text, best first
    pub async fn search(&self, query: &str) -> Result<Vec<ReferenceChunk>> {
        self.check_model()?;

        let query_vector = self.embedder.embed(query).await?;
        let hits = self.store.similarity_search(
            &query_vector,
            self.config.top_k,
            self.config.min_similarity,
        )?;

        debug!(
            "Retrieved {} reference chunks (top_k={}, min_similarity={})",
            hits.len(),
            self.config.top_k,
            self.config.min_similarity
        );

        Ok(hits.into_iter().map(ReferenceChunk::from).collect())
    }

    /// Stored vectors must come from the model that embeds the query
    fn check_model(&self) -> Result<()> {
        let expected = self.embedder.model_name();
        match self
            .store
            .embedding_models()?
            .into_iter()
            .find(|found| found != expected)
        {
            Some(found) => Err(HuntError::EmbeddingModelMismatch {
                expected: expected.to_string(),
                found,
            }),
            None => Ok(()),
        }
    }
}
