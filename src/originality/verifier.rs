use super::policy::OriginalityPolicy;
use super::signals::{jaccard, normalize_tokens, shingles, NGRAM_SIZE};
use crate::embedding::{cosine_similarity, EmbeddingProvider};
use crate::error::{HuntError, Result};
use crate::generation::PuzzleDraft;
use crate::patterns::{LeakMatch, PatternRegistry};
use crate::retrieval::ReferenceChunk;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Similarity of a draft against one reference chunk
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceSignals {
    pub chunk_id: i64,
    pub cosine: f32,
    pub jaccard: f32,
}

/// Why a draft was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    CosineTooHigh { chunk_id: i64, score: f32, limit: f32 },
    JaccardTooHigh { chunk_id: i64, score: f32, limit: f32 },
    SourceLeak { matches: Vec<LeakMatch> },
}

/// Outcome of an originality check
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub signals: Vec<ReferenceSignals>,
    pub leaks: Vec<LeakMatch>,
    pub reasons: Vec<RejectionReason>,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn max_cosine(&self) -> Option<f32> {
        self.signals.iter().map(|s| s.cosine).reduce(f32::max)
    }

    pub fn max_jaccard(&self) -> Option<f32> {
        self.signals.iter().map(|s| s.jaccard).reduce(f32::max)
    }
}

/// Every threshold violation in `signals` and `leaks` under `policy`
///
/// A score equal to its threshold passes; only exceeding it rejects.
pub fn evaluate(
    signals: &[ReferenceSignals],
    leaks: &[LeakMatch],
    policy: &OriginalityPolicy,
) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();

    for signal in signals {
        if signal.cosine > policy.max_cosine_similarity {
            reasons.push(RejectionReason::CosineTooHigh {
                chunk_id: signal.chunk_id,
                score: signal.cosine,
                limit: policy.max_cosine_similarity,
            });
        }
        if signal.jaccard > policy.max_jaccard_overlap {
            reasons.push(RejectionReason::JaccardTooHigh {
                chunk_id: signal.chunk_id,
                score: signal.jaccard,
                limit: policy.max_jaccard_overlap,
            });
        }
    }

    if !leaks.is_empty() {
        reasons.push(RejectionReason::SourceLeak {
            matches: leaks.to_vec(),
        });
    }

    reasons
}

/// Scores drafts against retrieved references
pub struct Verifier {
    embedder: Arc<dyn EmbeddingProvider>,
    patterns: Arc<PatternRegistry>,
}

impl Verifier {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, patterns: Arc<PatternRegistry>) -> Self {
        Self { embedder, patterns }
    }

    /// Score `draft` against every reference and apply `policy`
    ///
    /// Embedding failures propagate; they are never read as a pass.
    pub async fn verify(
        &self,
        draft: &PuzzleDraft,
        references: &[ReferenceChunk],
        policy: &OriginalityPolicy,
    ) -> Result<Verdict> {
        let text = draft.evaluation_text();
        let leaks = self.patterns.detect_leaks(&text);

        let mut signals = Vec::with_capacity(references.len());
        if !references.is_empty() {
            let draft_vector = self.embedder.embed(&text).await?;
            let draft_tokens = normalize_tokens(&text);
            let draft_shingles = shingles(&draft_tokens, NGRAM_SIZE);

            for reference in references {
                let reference_vector = match &reference.embedding {
                    Some(vector) => vector.clone(),
                    None => {
                        warn!(
                            "Reference chunk {} has no stored vector, re-embedding",
                            reference.chunk_id
                        );
                        self.embedder.embed(&reference.content).await?
                    }
                };

                if reference_vector.len() != draft_vector.len() {
                    return Err(HuntError::VectorDimensionMismatch {
                        chunk_id: reference.chunk_id,
                        expected: draft_vector.len(),
                        actual: reference_vector.len(),
                    });
                }

                let reference_tokens = normalize_tokens(&reference.content);
                signals.push(ReferenceSignals {
                    chunk_id: reference.chunk_id,
                    cosine: cosine_similarity(&draft_vector, &reference_vector),
                    jaccard: jaccard(
                        &draft_shingles,
                        &shingles(&reference_tokens, NGRAM_SIZE),
                    ),
                });
            }
        }

        let reasons = evaluate(&signals, &leaks, policy);
        let verdict = Verdict {
            signals,
            leaks,
            reasons,
        };

        debug!(
            "Verdict: accepted={} max_cosine={:?} max_jaccard={:?} leaks={}",
            verdict.is_accepted(),
            verdict.max_cosine(),
            verdict.max_jaccard(),
            verdict.leaks.len()
        );

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternKind;

    fn signal(chunk_id: i64, cosine: f32, jaccard: f32) -> ReferenceSignals {
        ReferenceSignals {
            chunk_id,
            cosine,
            jaccard,
        }
    }

    #[test]
    fn test_no_references_no_leaks_accepts() {
        assert!(evaluate(&[], &[], &OriginalityPolicy::default()).is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = OriginalityPolicy::default();
        let at_limit = signal(1, policy.max_cosine_similarity, policy.max_jaccard_overlap);
        assert!(evaluate(&[at_limit], &[], &policy).is_empty());
    }

    #[test]
    fn test_each_signal_rejects_independently() {
        let policy = OriginalityPolicy::default();

        let reasons = evaluate(&[signal(7, 0.91, 0.02)], &[], &policy);
        assert_eq!(
            reasons,
            vec![RejectionReason::CosineTooHigh {
                chunk_id: 7,
                score: 0.91,
                limit: 0.82
            }]
        );

        let reasons = evaluate(&[signal(8, 0.10, 0.40)], &[], &policy);
        assert!(matches!(
            reasons.as_slice(),
            [RejectionReason::JaccardTooHigh { chunk_id: 8, .. }]
        ));

        let leak = LeakMatch {
            pattern: "url".to_string(),
            kind: PatternKind::Url,
            text: "www.example.com".to_string(),
        };
        let reasons = evaluate(&[signal(9, 0.1, 0.0)], &[leak], &policy);
        assert!(matches!(
            reasons.as_slice(),
            [RejectionReason::SourceLeak { matches }] if matches.len() == 1
        ));
    }

    #[test]
    fn test_any_reference_can_reject() {
        let policy = OriginalityPolicy::default();
        let reasons = evaluate(
            &[signal(1, 0.2, 0.0), signal(2, 0.3, 0.0), signal(3, 0.95, 0.0)],
            &[],
            &policy,
        );
        assert_eq!(reasons.len(), 1);
    }

    #[test]
    fn test_verdict_maxima() {
        let verdict = Verdict {
            signals: vec![signal(1, 0.4, 0.1), signal(2, 0.7, 0.05)],
            leaks: vec![],
            reasons: vec![],
        };
        assert!(verdict.is_accepted());
        assert_eq!(verdict.max_cosine(), Some(0.7));
        assert_eq!(verdict.max_jaccard(), Some(0.1));

        let empty = Verdict {
            signals: vec![],
            leaks: vec![],
            reasons: vec![],
        };
        assert_eq!(empty.max_cosine(), None);
    }

    #[test]
    fn test_stricter_policy_never_accepts_more() {
        let signals = [signal(1, 0.6, 0.1), signal(2, 0.75, 0.15)];
        let loose = OriginalityPolicy::new(0.9, 0.3).unwrap();
        let strict = OriginalityPolicy::new(0.7, 0.12).unwrap();

        assert!(evaluate(&signals, &[], &loose).is_empty());
        assert!(!evaluate(&signals, &[], &strict).is_empty());
    }
}
