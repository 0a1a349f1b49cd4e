/// OpenAI-compatible HTTP embedding provider
use super::provider::{check_dimensions, EmbeddingError, EmbeddingProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Embedding provider backed by an OpenAI-compatible `/embeddings` endpoint
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_name: String,
    dimension: usize,
}

impl RemoteEmbeddingProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_name: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            dimension,
        }
    }

    /// Create from the API key stored in `api_key_env`
    pub fn from_env(
        base_url: &str,
        api_key_env: &str,
        model_name: &str,
        dimension: usize,
    ) -> Result<Self, EmbeddingError> {
        let api_key = std::env::var(api_key_env).map_err(|_| {
            EmbeddingError::InitializationError(format!("{} not set", api_key_env))
        })?;
        Ok(Self::new(base_url, api_key, model_name, dimension))
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = input.len();
        let body = ApiRequest {
            model: &self.model_name,
            input,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::GenerationError(e.to_string()))?;

        if parsed.data.len() != expected {
            return Err(EmbeddingError::GenerationError(format!(
                "Embedding count mismatch: expected {}, got {}",
                expected,
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        check_dimensions(&embeddings, self.dimension)?;

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        self.request(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::GenerationError("No embeddings generated".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(
                "Batch contains empty text".to_string(),
            ));
        }
        self.request(texts.to_vec()).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct ApiResponse {
    data: Vec<ApiEmbedding>,
}

#[derive(Deserialize)]
struct ApiEmbedding {
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let provider =
            RemoteEmbeddingProvider::new("http://localhost:11434/v1/", "key", "nomic", 768);
        assert_eq!(provider.base_url, "http://localhost:11434/v1");
        assert_eq!(provider.dimension(), 768);
        assert_eq!(provider.model_name(), "nomic");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[0.5,0.5]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0]}
        ],"model":"text-embedding-3-small"}"#;
        let mut parsed: ApiResponse = serde_json::from_str(json).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_request() {
        let provider = RemoteEmbeddingProvider::new("http://127.0.0.1:9", "key", "m", 2);
        assert!(matches!(
            provider.embed("").await,
            Err(EmbeddingError::InvalidInput(_))
        ));
    }
}
