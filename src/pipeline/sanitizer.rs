use crate::generation::PuzzleDraft;
use crate::patterns::PatternRegistry;
use std::sync::Arc;

/// Strips leak-pattern remnants from the narrative fields of an accepted draft
pub struct Sanitizer {
    patterns: Arc<PatternRegistry>,
}

impl Sanitizer {
    pub fn new(patterns: Arc<PatternRegistry>) -> Self {
        Self { patterns }
    }

    /// Sanitize `story` and `setup`; every other field is left as generated
    pub fn apply(&self, mut draft: PuzzleDraft) -> PuzzleDraft {
        draft.story = self.patterns.sanitize(&draft.story);
        draft.setup = self.patterns.sanitize(&draft.setup);
        draft
    }
}
