//! Shared fixtures: deterministic embedder, scripted LLM, temp store
#![allow(dead_code)]

use async_trait::async_trait;
use huntsmith::config::Config;
use huntsmith::embedding::{EmbeddingError, EmbeddingProvider};
use huntsmith::generation::llm::{CompletionRequest, CompletionResponse, LlmError, LlmProvider};
use huntsmith::patterns::PatternRegistry;
use huntsmith::pipeline::GenerationService;
use huntsmith::storage::{Database, KnowledgeStore};
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const DIMENSION: usize = 512;

/// Bag-of-words embedder: token counts hashed into buckets, L2-normalized
pub struct HashingEmbedder {
    model: String,
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::with_model("hashing-bow-512")
    }

    pub fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSION];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            vector[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Embedder whose service is always down
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Network("connection refused".to_string()))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "hashing-bow-512"
    }
}

/// LLM that replays a script; the last entry repeats once the script runs out
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_script(responses.into_iter().map(Ok).collect())
    }

    /// `Err` entries surface as network failures
    pub fn with_script(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match script.pop_front() {
                Some(entry) => {
                    *last = Some(entry.clone());
                    entry
                }
                None => last
                    .clone()
                    .unwrap_or_else(|| Err("script is empty".to_string())),
            }
        };

        match next {
            Ok(text) => Ok(CompletionResponse {
                model: request.model,
                text,
            }),
            Err(message) => Err(LlmError::Network(message)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// JSON draft whose narrative is `story`
pub fn draft_json(title: &str, story: &str) -> String {
    serde_json::json!({
        "title": title,
        "story": story,
        "setup": "",
        "steps": ["Walk the marked route"],
        "solution": "Unlock the box",
        "hints": [],
        "props": ["lockbox"],
        "safety": "Supervise younger players."
    })
    .to_string()
}

/// Reference text every "copy" test ingests
pub const REFERENCE_TEXT: &str = "The keeper of the lighthouse hid a brass key beneath the \
    seventh stair of the spiral tower. Whoever counted the gulls at dawn would learn which \
    lantern held the cipher, and the cipher spelled the name of the drowned captain whose \
    ship still rests beyond the northern reef.";

/// A draft sharing no vocabulary with `REFERENCE_TEXT`
pub fn original_draft() -> String {
    serde_json::json!({
        "title": "Orchard Clockwork",
        "story": "Marigold bees buzzed around copper gears; every apricot ticked softly.",
        "setup": "Scatter painted walnuts under hedges.",
        "steps": ["Gather walnuts", "Sort walnuts by colour"],
        "solution": "Purple, amber, green.",
        "hints": ["Bees prefer amber"],
        "props": ["walnuts", "paint"],
        "safety": ["Check for nut allergies"]
    })
    .to_string()
}

/// Draft that reproduces the reference word for word
pub fn copied_draft() -> String {
    draft_json("The Drowned Captain", REFERENCE_TEXT)
}

pub fn request_json() -> &'static str {
    r#"{
        "theme": "stormy lighthouse",
        "mechanic": "counting cipher",
        "scene": "tower-stair",
        "tone": "eerie",
        "difficulty": 3,
        "materials": ["lantern", "chalk"],
        "duration_minutes": 25
    }"#
}

pub fn test_config(temp: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = temp.path().to_path_buf();
    config.embedding.dimension = DIMENSION;
    config.chunking.max_chars = 400;
    config.chunking.overlap = 40;
    // Bag-of-words vectors are never negative; every chunk becomes a reference
    config.retrieval.min_similarity = 0.0;
    config
}

pub fn open_store(temp: &TempDir) -> Arc<Database> {
    Arc::new(Database::new(&temp.path().join("knowledge.sqlite")).unwrap())
}

pub fn service(
    config: &Config,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn KnowledgeStore>,
) -> GenerationService {
    let patterns = Arc::new(PatternRegistry::builtin().unwrap());
    GenerationService::from_config(config, embedder, llm, store, patterns)
}
