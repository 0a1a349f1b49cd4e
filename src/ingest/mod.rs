//! Offline knowledge-base ingestion
//!
//! The single writer: read a document, chunk it, embed the chunks in
//! batches and persist the source with all of its chunks at once.

use crate::chunking::Chunker;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::error::{HuntError, Result};
use crate::storage::{KnowledgeSource, KnowledgeStore, NewChunk, NewSource};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Caller-supplied source metadata
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub title: String,
    pub license_note: Option<String>,
    pub origin_url: Option<String>,
}

/// Progress after each embedded chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestProgress {
    pub embedded: usize,
    pub total: usize,
}

/// Result of ingesting one document
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source: KnowledgeSource,
    pub chunk_count: usize,
    pub duration_ms: u64,
}

/// Chunks, embeds and stores reference documents
pub struct Ingestor {
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn KnowledgeStore>,
    batch_size: usize,
}

impl Ingestor {
    pub fn new(
        chunker: Chunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn KnowledgeStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Ingest a UTF-8 document from disk
    pub async fn ingest_file<F>(
        &self,
        path: &Path,
        options: &IngestOptions,
        progress: F,
    ) -> Result<IngestReport>
    where
        F: FnMut(IngestProgress),
    {
        let text = std::fs::read_to_string(path).map_err(|e| HuntError::Io {
            source: e,
            context: format!("Failed to read document: {:?}", path),
        })?;

        if text.trim().is_empty() {
            return Err(HuntError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }

        self.ingest_text(&text, options, progress).await
    }

    /// Ingest document text
    ///
    /// Nothing is written unless every chunk embeds successfully.
    pub async fn ingest_text<F>(
        &self,
        text: &str,
        options: &IngestOptions,
        mut progress: F,
    ) -> Result<IngestReport>
    where
        F: FnMut(IngestProgress),
    {
        let start = std::time::Instant::now();

        if options.title.trim().is_empty() {
            return Err(HuntError::InvalidRequest("title cannot be empty".to_string()));
        }
        if text.trim().is_empty() {
            return Err(HuntError::EmptyDocument {
                path: options.title.clone().into(),
            });
        }

        let content_hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        if let Some(existing) = self.store.find_source_by_hash(&content_hash)? {
            return Err(HuntError::SourceAlreadyIngested {
                id: existing.id,
                title: existing.title,
            });
        }

        let chunks = self.chunker.chunk(text);
        let total = chunks.len();
        info!("Ingesting '{}': {} chunks", options.title, total);

        let mut new_chunks = Vec::with_capacity(total);
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != texts.len() {
                return Err(EmbeddingError::GenerationError(format!(
                    "Expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ))
                .into());
            }

            for (content, embedding) in texts.into_iter().zip(embeddings) {
                new_chunks.push(NewChunk { content, embedding });
                progress(IngestProgress {
                    embedded: new_chunks.len(),
                    total,
                });
            }
            debug!("Embedded {}/{} chunks", new_chunks.len(), total);
        }

        let source = self.store.insert_source(
            &NewSource {
                title: options.title.clone(),
                origin_url: options.origin_url.clone(),
                license_note: options.license_note.clone(),
                content_hash,
            },
            &new_chunks,
            self.embedder.model_name(),
        )?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Ingested '{}' as {} ({} chunks, {}ms)",
            source.title, source.id, total, duration_ms
        );

        Ok(IngestReport {
            source,
            chunk_count: total,
            duration_ms,
        })
    }
}
