//! Draft generation
//!
//! Builds the constrained prompt for a request and turns the provider's
//! response into a structured `PuzzleDraft`.

pub mod draft;
pub mod llm;
pub mod prompt;

pub use draft::PuzzleDraft;
pub use llm::{build_llm_provider, CompletionRequest, LlmError, LlmProvider};

use crate::config::LlmConfig;
use crate::error::{HuntError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// What the caller asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub theme: String,
    pub mechanic: String,
    /// Scene identifier within the hunt
    pub scene: String,
    pub tone: String,
    /// 1 (gentle) to 5 (fiendish)
    pub difficulty: u8,
    #[serde(default)]
    pub materials: Vec<String>,
    pub duration_minutes: u32,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("theme", &self.theme),
            ("mechanic", &self.mechanic),
            ("scene", &self.scene),
        ] {
            if value.trim().is_empty() {
                return Err(HuntError::InvalidRequest(format!("{} cannot be empty", field)));
            }
        }
        if !(1..=5).contains(&self.difficulty) {
            return Err(HuntError::InvalidRequest(format!(
                "difficulty must be between 1 and 5, got {}",
                self.difficulty
            )));
        }
        if self.duration_minutes == 0 {
            return Err(HuntError::InvalidRequest(
                "duration_minutes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Requests one draft per call from the configured provider
pub struct Generator {
    llm: Arc<dyn LlmProvider>,
    config: LlmConfig,
}

impl Generator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: LlmConfig) -> Self {
        Self { llm, config }
    }

    /// One provider call
    ///
    /// Provider failures surface as `GenerationService`; unparseable output
    /// as `MalformedDraft`.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        style_hint: Option<&str>,
    ) -> Result<PuzzleDraft> {
        let completion = CompletionRequest::new(
            &self.config.model,
            prompt::user_prompt(request, style_hint),
        )
        .with_system(prompt::SYSTEM_PROMPT)
        .with_max_tokens(self.config.max_tokens)
        .with_temperature(self.config.temperature)
        .with_json_output();

        let response = self.llm.complete(completion).await?;
        debug!(
            "{} returned {} chars from {}",
            self.llm.name(),
            response.text.len(),
            response.model
        );

        PuzzleDraft::parse(&response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            theme: "clockwork garden".to_string(),
            mechanic: "weight puzzle".to_string(),
            scene: "greenhouse".to_string(),
            tone: "whimsical".to_string(),
            difficulty: 2,
            materials: vec![],
            duration_minutes: 15,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_invalid_requests() {
        let mut r = request();
        r.difficulty = 0;
        assert!(matches!(r.validate(), Err(HuntError::InvalidRequest(_))));

        let mut r = request();
        r.difficulty = 6;
        assert!(r.validate().is_err());

        let mut r = request();
        r.duration_minutes = 0;
        assert!(r.validate().is_err());

        let mut r = request();
        r.theme = "   ".to_string();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_request_from_json() {
        let raw = r#"{
            "theme": "pirate cove",
            "mechanic": "map fragments",
            "scene": "beach-1",
            "tone": "playful",
            "difficulty": 1,
            "duration_minutes": 10
        }"#;
        let r: GenerationRequest = serde_json::from_str(raw).unwrap();
        assert!(r.materials.is_empty());
        assert!(r.validate().is_ok());
    }
}
