use super::sanitizer::Sanitizer;
use crate::error::{HuntError, Result};
use crate::generation::{GenerationRequest, Generator, PuzzleDraft};
use crate::originality::{OriginalityPolicy, RejectionReason, Verdict, Verifier};
use crate::patterns::LeakMatch;
use crate::retrieval::ReferenceChunk;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Retry loop states
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    Generating,
    Verifying(PuzzleDraft),
    Mutating,
    Accepted(PuzzleDraft),
    Exhausted,
}

impl AttemptState {
    fn name(&self) -> &'static str {
        match self {
            AttemptState::Generating => "generating",
            AttemptState::Verifying(_) => "verifying",
            AttemptState::Mutating => "mutating",
            AttemptState::Accepted(_) => "accepted",
            AttemptState::Exhausted => "exhausted",
        }
    }
}

/// How one attempt ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted,
    Rejected { reasons: Vec<RejectionReason> },
    Malformed { message: String },
}

/// One generate-and-verify round; lives only for the request
#[derive(Debug, Clone)]
pub struct GenerationAttempt {
    pub ordinal: usize,
    pub style_hint: Option<String>,
    pub draft: Option<PuzzleDraft>,
    pub verdict: Option<Verdict>,
    pub outcome: AttemptOutcome,
}

/// Draft-free summary of an attempt, safe to hand back to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptReport {
    pub ordinal: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_hint: Option<String>,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cosine: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_jaccard: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leak_matches: Vec<LeakMatch>,
}

impl From<&GenerationAttempt> for AttemptReport {
    fn from(attempt: &GenerationAttempt) -> Self {
        let verdict = attempt.verdict.as_ref();
        Self {
            ordinal: attempt.ordinal,
            style_hint: attempt.style_hint.clone(),
            outcome: attempt.outcome.clone(),
            max_cosine: verdict.and_then(Verdict::max_cosine),
            max_jaccard: verdict.and_then(Verdict::max_jaccard),
            leak_matches: verdict.map(|v| v.leaks.clone()).unwrap_or_default(),
        }
    }
}

/// A sanitized draft that passed verification
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedDraft {
    pub draft: PuzzleDraft,
    /// Attempts consumed, including the accepted one
    pub attempt_count: usize,
    pub attempts: Vec<AttemptReport>,
}

/// Bounded generate, verify and mutate loop
pub struct RetryController {
    generator: Generator,
    verifier: Verifier,
    sanitizer: Sanitizer,
    max_attempts: usize,
    style_hints: Vec<String>,
}

impl RetryController {
    pub fn new(
        generator: Generator,
        verifier: Verifier,
        sanitizer: Sanitizer,
        max_attempts: usize,
        style_hints: Vec<String>,
    ) -> Self {
        Self {
            generator,
            verifier,
            sanitizer,
            max_attempts: max_attempts.max(1),
            style_hints,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Tone override for attempt `ordinal`; the ladder's last rung repeats
    pub fn style_hint_for(&self, ordinal: usize) -> Option<&str> {
        ladder_rung(&self.style_hints, ordinal)
    }

    /// Run the loop for one request
    ///
    /// Returns the sanitized draft on acceptance, `OriginalityExhausted`
    /// after the final rejection, and any service error as soon as it occurs.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        references: &[ReferenceChunk],
        policy: &OriginalityPolicy,
    ) -> Result<AcceptedDraft> {
        let mut reports: Vec<AttemptReport> = Vec::new();
        let mut ordinal = 1;
        let mut state = AttemptState::Generating;

        loop {
            debug!("Attempt {}/{}: {}", ordinal, self.max_attempts, state.name());
            let style_hint = self.style_hint_for(ordinal);

            state = match state {
                AttemptState::Generating => match self.generator.generate(request, style_hint).await {
                    Ok(draft) => AttemptState::Verifying(draft),
                    Err(HuntError::MalformedDraft(message)) => {
                        warn!("Attempt {} produced a malformed draft: {}", ordinal, message);
                        reports.push(AttemptReport::from(&GenerationAttempt {
                            ordinal,
                            style_hint: style_hint.map(str::to_string),
                            draft: None,
                            verdict: None,
                            outcome: AttemptOutcome::Malformed { message },
                        }));
                        AttemptState::Mutating
                    }
                    Err(e) => return Err(e),
                },
                AttemptState::Verifying(draft) => {
                    let verdict = self.verifier.verify(&draft, references, policy).await?;
                    let outcome = if verdict.is_accepted() {
                        AttemptOutcome::Accepted
                    } else {
                        warn!(
                            "Attempt {} rejected: {} threshold violations",
                            ordinal,
                            verdict.reasons.len()
                        );
                        AttemptOutcome::Rejected {
                            reasons: verdict.reasons.clone(),
                        }
                    };
                    let attempt = GenerationAttempt {
                        ordinal,
                        style_hint: style_hint.map(str::to_string),
                        draft: Some(draft),
                        verdict: Some(verdict),
                        outcome,
                    };
                    reports.push(AttemptReport::from(&attempt));

                    match (attempt.outcome, attempt.draft) {
                        (AttemptOutcome::Accepted, Some(draft)) => AttemptState::Accepted(draft),
                        _ => AttemptState::Mutating,
                    }
                }
                AttemptState::Mutating if ordinal >= self.max_attempts => AttemptState::Exhausted,
                AttemptState::Mutating => {
                    ordinal += 1;
                    AttemptState::Generating
                }
                AttemptState::Accepted(draft) => {
                    info!("Draft accepted on attempt {}", ordinal);
                    return Ok(AcceptedDraft {
                        draft: self.sanitizer.apply(draft),
                        attempt_count: ordinal,
                        attempts: reports,
                    });
                }
                AttemptState::Exhausted => {
                    warn!("No original draft after {} attempts", reports.len());
                    return Err(HuntError::OriginalityExhausted { attempts: reports });
                }
            }
        }
    }
}

/// Attempt 1 keeps the requested tone; attempt n uses rung n-2, clamped
fn ladder_rung(hints: &[String], ordinal: usize) -> Option<&str> {
    if ordinal < 2 {
        return None;
    }
    let last = hints.len().checked_sub(1)?;
    hints.get((ordinal - 2).min(last)).map(String::as_str)
}
