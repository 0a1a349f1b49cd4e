use crate::config::OriginalityConfig;
use crate::error::{HuntError, Result};
use serde::{Deserialize, Serialize};

/// Thresholds a draft must stay at or under for every reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginalityPolicy {
    pub max_cosine_similarity: f32,
    pub max_jaccard_overlap: f32,
}

impl OriginalityPolicy {
    pub fn new(max_cosine_similarity: f32, max_jaccard_overlap: f32) -> Result<Self> {
        let policy = Self {
            max_cosine_similarity,
            max_jaccard_overlap,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_config(config: &OriginalityConfig) -> Self {
        Self {
            max_cosine_similarity: config.max_cosine_similarity,
            max_jaccard_overlap: config.max_jaccard_overlap,
        }
    }

    /// Both thresholds must lie in [0, 1]
    pub fn validate(&self) -> Result<()> {
        for (path, value) in [
            ("max_cosine_similarity", self.max_cosine_similarity),
            ("max_jaccard_overlap", self.max_jaccard_overlap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(HuntError::InvalidConfigValue {
                    path: path.to_string(),
                    message: format!("Must be between 0.0 and 1.0, got {}", value),
                });
            }
        }
        Ok(())
    }
}

impl Default for OriginalityPolicy {
    fn default() -> Self {
        Self {
            max_cosine_similarity: 0.82,
            max_jaccard_overlap: 0.18,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = OriginalityPolicy::default();
        assert_eq!(policy.max_cosine_similarity, 0.82);
        assert_eq!(policy.max_jaccard_overlap, 0.18);
        assert_eq!(
            OriginalityPolicy::from_config(&OriginalityConfig::default()),
            policy
        );
    }

    #[test]
    fn test_out_of_range() {
        assert!(OriginalityPolicy::new(1.2, 0.1).is_err());
        assert!(OriginalityPolicy::new(0.8, -0.1).is_err());
        assert!(OriginalityPolicy::new(f32::NAN, 0.1).is_err());
        assert!(OriginalityPolicy::new(0.0, 1.0).is_ok());
    }
}
