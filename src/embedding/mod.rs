//! Embedding generation
//!
//! - `EmbeddingProvider` trait for abstraction over embedding services
//! - `FastEmbedProvider` for local embedding ("offline" mode)
//! - `RemoteEmbeddingProvider` for OpenAI-compatible endpoints ("online" mode)
mod provider;
mod remote;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use remote::RemoteEmbeddingProvider;

use crate::config::EmbeddingConfig;
use std::sync::Arc;

/// Build the provider selected by `embedding.mode`
pub fn build_provider(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    match config.mode.as_str() {
        "offline" => Ok(Arc::new(FastEmbedProvider::new(&config.model)?)),
        "online" => Ok(Arc::new(RemoteEmbeddingProvider::from_env(
            &config.base_url,
            &config.api_key_env,
            &config.model,
            config.dimension,
        )?)),
        other => Err(EmbeddingError::InitializationError(format!(
            "Unknown embedding mode: {}",
            other
        ))),
    }
}

/// Cosine similarity between two vectors
///
/// Returns 0.0 when either vector has zero magnitude. Callers check lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_scale_invariant() {
        let a = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 1.0, 0.5]);
        let b = cosine_similarity(&[10.0, 20.0, 30.0], &[2.0, 1.0, 0.5]);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_mode() {
        let mut config = crate::config::Config::default().embedding;
        config.mode = "hybrid".to_string();
        assert!(build_provider(&config).is_err());
    }
}
