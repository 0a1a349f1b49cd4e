//! Generation pipeline
//!
//! Wires retrieval, generation, verification and sanitization into the
//! request-scoped `generate` operation.

pub mod controller;
pub mod sanitizer;

pub use controller::{
    AcceptedDraft, AttemptOutcome, AttemptReport, AttemptState, GenerationAttempt,
    RetryController,
};
pub use sanitizer::Sanitizer;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::{HuntError, Result};
use crate::generation::{GenerationRequest, Generator, LlmProvider, PuzzleDraft};
use crate::originality::{OriginalityPolicy, Verifier};
use crate::patterns::PatternRegistry;
use crate::retrieval::Retriever;
use crate::storage::KnowledgeStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Message returned with a 409 response
pub const EXHAUSTED_MESSAGE: &str =
    "could not generate sufficiently original content, try a different prompt";

/// Request-scoped generation over shared, read-only components
pub struct GenerationService {
    store: Arc<dyn KnowledgeStore>,
    retriever: Retriever,
    controller: RetryController,
    default_policy: OriginalityPolicy,
}

impl GenerationService {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        retriever: Retriever,
        controller: RetryController,
        default_policy: OriginalityPolicy,
    ) -> Self {
        Self {
            store,
            retriever,
            controller,
            default_policy,
        }
    }

    /// Assemble the service from configuration and the shared providers
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn KnowledgeStore>,
        patterns: Arc<PatternRegistry>,
    ) -> Self {
        let retriever = Retriever::new(embedder.clone(), store.clone(), config.retrieval.clone());
        let controller = RetryController::new(
            Generator::new(llm, config.llm.clone()),
            Verifier::new(embedder, patterns.clone()),
            Sanitizer::new(patterns),
            config.generation.max_attempts,
            config.generation.style_hints.clone(),
        );

        Self::new(
            store,
            retriever,
            controller,
            OriginalityPolicy::from_config(&config.originality),
        )
    }

    /// Stored policy record, else the configured defaults
    pub fn policy(&self) -> Result<OriginalityPolicy> {
        Ok(self.store.load_policy()?.unwrap_or(self.default_policy))
    }

    /// Produce one original draft for `request`
    pub async fn generate(&self, request: &GenerationRequest) -> Result<AcceptedDraft> {
        request.validate()?;

        let policy = self.policy()?;
        let references = self.retriever.retrieve(request).await?;
        info!(
            "Generating for scene '{}' against {} references",
            request.scene,
            references.len()
        );

        self.controller.run(request, &references, &policy).await
    }
}

/// HTTP-style rendering of a generation outcome
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<PuzzleDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub attempts: Vec<AttemptReport>,
}

impl GenerationResponse {
    /// 200 for an accepted draft, 409 for exhaustion; other errors pass through
    pub fn from_result(result: Result<AcceptedDraft>) -> Result<Self> {
        match result {
            Ok(accepted) => Ok(Self {
                status: 200,
                draft: Some(accepted.draft),
                message: None,
                attempts: accepted.attempts,
            }),
            Err(HuntError::OriginalityExhausted { attempts }) => Ok(Self {
                status: 409,
                draft: None,
                message: Some(EXHAUSTED_MESSAGE.to_string()),
                attempts,
            }),
            Err(e) => Err(e),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;

    fn draft() -> PuzzleDraft {
        PuzzleDraft {
            title: "T".to_string(),
            story: "S".to_string(),
            setup: String::new(),
            steps: vec!["one".to_string()],
            solution: "X".to_string(),
            hints: vec![],
            props: vec![],
            safety: vec![],
        }
    }

    #[test]
    fn test_accepted_is_200() {
        let response = GenerationResponse::from_result(Ok(AcceptedDraft {
            draft: draft(),
            attempt_count: 1,
            attempts: vec![AttemptReport {
                ordinal: 1,
                style_hint: None,
                outcome: AttemptOutcome::Accepted,
                max_cosine: None,
                max_jaccard: None,
                leak_matches: vec![],
            }],
        }))
        .unwrap();

        assert_eq!(response.status_code(), 200);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["draft"]["title"], "T");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_exhausted_is_409() {
        let response =
            GenerationResponse::from_result(Err(HuntError::OriginalityExhausted {
                attempts: vec![],
            }))
            .unwrap();

        assert_eq!(response.status_code(), 409);
        assert!(!response.is_success());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], EXHAUSTED_MESSAGE);
        assert!(json.get("draft").is_none());
    }

    #[test]
    fn test_service_errors_pass_through() {
        let result = GenerationResponse::from_result(Err(HuntError::EmbeddingService(
            EmbeddingError::Network("timeout".to_string()),
        )));
        assert!(matches!(result, Err(HuntError::EmbeddingService(_))));
    }
}
