//! Pattern registry for source-leak detection and sanitization
//!
//! This module provides:
//! - Pre-compiled regex patterns loaded from a TOML file or the built-in set
//! - Leak detection over draft text (URLs, reading platforms, chapter/page
//!   references, attribution phrases)
//! - The sanitizer transform that strips the removable subset of the family

use crate::config::PatternsConfig;
use crate::error::{HuntError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// What a leak pattern reveals about the underlying source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// URL-shaped substring
    Url,
    /// Reader or document platform name
    Platform,
    /// Chapter or page reference
    Reference,
    /// "according to", "source:" and equivalents
    Attribution,
}

/// Leak pattern configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakPatternConfig {
    pub name: String,
    pub kind: PatternKind,
    pub pattern: String,
    /// Whether the sanitizer strips matches of this pattern
    #[serde(default)]
    pub sanitize: bool,
    #[serde(default)]
    pub description: String,
}

/// Leak patterns configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakPatternsConfig {
    pub pattern: Vec<LeakPatternConfig>,
}

impl Default for LeakPatternsConfig {
    fn default() -> Self {
        let entry = |name: &str, kind, pattern: &str, sanitize, description: &str| {
            LeakPatternConfig {
                name: name.to_string(),
                kind,
                pattern: pattern.to_string(),
                sanitize,
                description: description.to_string(),
            }
        };

        Self {
            pattern: vec![
                entry(
                    "url",
                    PatternKind::Url,
                    r#"(?i)\b(?:https?://|www\.)[^\s<>()\[\]]*[^\s<>()\[\].,;:!?'"]"#,
                    true,
                    "Explicit URL",
                ),
                entry(
                    "domain",
                    PatternKind::Url,
                    r"(?i)\b[a-z0-9][a-z0-9-]*\.(?:com|org|net|io|es|edu|info)\b(?:/[^\s<>()\[\]]*)?",
                    true,
                    "Bare domain name",
                ),
                entry(
                    "platform",
                    PatternKind::Platform,
                    r"(?i)\b(?:wattpad|scribd|goodreads|kindle|kobo|google\s+books|internet\s+archive|project\s+gutenberg|gutenberg|z-library|zlibrary|libgen|pdf\s?drive|issuu|fanfiction|archive\s+of\s+our\s+own|ao3|audible|storytel)\b",
                    true,
                    "Reader or document platform",
                ),
                entry(
                    "chapter_page",
                    PatternKind::Reference,
                    r"(?i)\b(?:chapter|chap\.|cap[ií]tulo|page|pages|pg\.|p[aá]gina|p[aá]ginas|p[aá]g\.|pp?\.)\s*\d+(?:\s*[-–]\s*\d+)?",
                    true,
                    "Chapter or page reference",
                ),
                entry(
                    "attribution",
                    PatternKind::Attribution,
                    r"(?i)(?:\baccording\s+to\b|\bsources?\s*:|\bseg[uú]n\b|\bfuentes?\s*:|\badapted\s+from\b|\btomado\s+de\b)",
                    false,
                    "Attribution phrase",
                ),
            ],
        }
    }
}

/// Compiled leak pattern with pre-compiled regex
#[derive(Debug, Clone)]
pub struct CompiledLeakPattern {
    pub name: String,
    pub kind: PatternKind,
    pub regex: Regex,
    pub sanitize: bool,
    pub description: String,
}

/// A leak pattern hit in some text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakMatch {
    pub pattern: String,
    pub kind: PatternKind,
    pub text: String,
}

/// Pattern registry with all pre-compiled leak patterns
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    pub leak_patterns: Vec<CompiledLeakPattern>,
    /// Pattern lookup by name
    pub patterns_by_name: HashMap<String, usize>,
    whitespace_runs: Regex,
    line_edges: Regex,
    space_before_punct: Regex,
    empty_brackets: Regex,
}

impl PatternRegistry {
    /// Registry with the built-in pattern set
    pub fn builtin() -> Result<Self> {
        Self::from_config(LeakPatternsConfig::default())
    }

    /// Registry from the `[patterns]` section: the file when set, else built-ins
    pub fn load(config: &PatternsConfig) -> Result<Self> {
        match &config.leak_file {
            Some(path) => Self::from_config_file(&crate::config::expand_path(path)?),
            None => Self::builtin(),
        }
    }

    /// Load pattern registry from a TOML pattern file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HuntError::Io {
            source: e,
            context: format!("Failed to read leak patterns: {:?}", path),
        })?;
        let config: LeakPatternsConfig = toml::from_str(&content)?;
        Self::from_config(config)
    }

    /// Build pattern registry from parsed configuration
    pub fn from_config(config: LeakPatternsConfig) -> Result<Self> {
        let mut leak_patterns = Vec::new();
        let mut patterns_by_name = HashMap::new();

        for (idx, cfg) in config.pattern.into_iter().enumerate() {
            let regex = Regex::new(&cfg.pattern).map_err(|e| {
                HuntError::Config(format!("Invalid regex for leak pattern '{}': {}", cfg.name, e))
            })?;

            patterns_by_name.insert(cfg.name.clone(), idx);
            leak_patterns.push(CompiledLeakPattern {
                name: cfg.name,
                kind: cfg.kind,
                regex,
                sanitize: cfg.sanitize,
                description: cfg.description,
            });
        }

        Ok(Self {
            leak_patterns,
            patterns_by_name,
            whitespace_runs: compile(r"[ \t]{2,}")?,
            line_edges: compile(r"(?m)^[ \t]+|[ \t]+$")?,
            space_before_punct: compile(r"[ \t]+([,.;:!?)])")?,
            empty_brackets: compile(r"\(\s*\)|\[\s*\]")?,
        })
    }

    /// True when any leak pattern matches
    pub fn has_leak(&self, text: &str) -> bool {
        self.leak_patterns.iter().any(|p| p.regex.is_match(text))
    }

    /// Every leak pattern hit in `text`, grouped by pattern order
    pub fn detect_leaks(&self, text: &str) -> Vec<LeakMatch> {
        self.leak_patterns
            .iter()
            .flat_map(|pattern| {
                pattern.regex.find_iter(text).map(|m| LeakMatch {
                    pattern: pattern.name.clone(),
                    kind: pattern.kind,
                    text: m.as_str().to_string(),
                })
            })
            .collect()
    }

    /// Strip sanitizable pattern hits and tidy the whitespace left behind
    ///
    /// Repeats until a pass changes nothing, so the output is a fixed point:
    /// `sanitize(sanitize(x)) == sanitize(x)`.
    pub fn sanitize(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let next = self.sanitize_pass(&current);
            if next == current {
                return current;
            }
            // Every changing pass strictly shortens the text
            current = next;
        }
    }

    fn sanitize_pass(&self, text: &str) -> String {
        let mut result = text.to_string();
        let mut stripped = false;
        for pattern in self.leak_patterns.iter().filter(|p| p.sanitize) {
            if pattern.regex.is_match(&result) {
                result = pattern.regex.replace_all(&result, "").into_owned();
                stripped = true;
            }
        }

        // Text without a sanitizable hit is left exactly as written
        if !stripped {
            return result;
        }

        result = self.empty_brackets.replace_all(&result, "").into_owned();
        result = self.whitespace_runs.replace_all(&result, " ").into_owned();
        result = self.space_before_punct.replace_all(&result, "$1").into_owned();
        result = self.line_edges.replace_all(&result, "").into_owned();
        result.trim().to_string()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| HuntError::Config(format!("Invalid regex: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PatternRegistry {
        PatternRegistry::builtin().unwrap()
    }

    fn kinds(text: &str) -> Vec<PatternKind> {
        registry()
            .detect_leaks(text)
            .into_iter()
            .map(|m| m.kind)
            .collect()
    }

    #[test]
    fn test_builtin_patterns_compile() {
        let registry = registry();
        assert_eq!(registry.leak_patterns.len(), 5);
        assert!(registry.patterns_by_name.contains_key("chapter_page"));
    }

    #[test]
    fn test_according_to_page() {
        let found = kinds("The code is hidden according to page 12 of the ledger.");
        assert!(found.contains(&PatternKind::Attribution));
        assert!(found.contains(&PatternKind::Reference));
    }

    #[test]
    fn test_detects_urls_platforms_and_spanish_references() {
        assert!(kinds("see https://example.org/book").contains(&PatternKind::Url));
        assert!(kinds("first posted on Wattpad").contains(&PatternKind::Platform));
        assert!(kinds("como en el capítulo 3").contains(&PatternKind::Reference));
        assert!(kinds("Fuente: un libro antiguo").contains(&PatternKind::Attribution));
    }

    #[test]
    fn test_clean_text_has_no_leaks() {
        let registry = registry();
        let text = "Follow the copper footprints from the fountain to the clocktower. \
                    Step 3: turn the dial until the raven faces north.";
        assert!(!registry.has_leak(text));
        assert!(registry.detect_leaks(text).is_empty());
    }

    #[test]
    fn test_sanitize_strips_removable_patterns() {
        let registry = registry();
        let cleaned = registry.sanitize(
            "The map (page 4) was found on Scribd at https://scribd.com/x, beside the well.",
        );
        assert_eq!(cleaned, "The map was found on at, beside the well.");
    }

    #[test]
    fn test_sanitize_keeps_attribution_phrases() {
        // Attribution is a rejection signal only; removing it would garble prose
        let registry = registry();
        assert_eq!(
            registry.sanitize("Sort the keys according to colour."),
            "Sort the keys according to colour."
        );
    }

    #[test]
    fn test_sanitize_reaches_fixed_point() {
        let registry = registry();
        // Removing the inner reference exposes a new "chapter 7"
        let once = registry.sanitize("Read chapter page 5 7 aloud.");
        assert_eq!(once, "Read aloud.");
        assert_eq!(registry.sanitize(&once), once);

        for text in [
            "",
            "plain text",
            "  padded \t text  ",
            "www.example.com www.example.com",
            "Line one\n\nLine two on Kindle p. 3",
        ] {
            let first = registry.sanitize(text);
            assert_eq!(registry.sanitize(&first), first);
        }
    }

    #[test]
    fn test_sanitize_leaves_clean_text_untouched() {
        let registry = registry();
        for text in [
            "Mark the tile ( ) with chalk,  then tap  twice .",
            "Draw a grid [ ] on the floor.",
            "  Indented riddle line",
        ] {
            assert_eq!(registry.sanitize(text), text);
        }
    }

    #[test]
    fn test_english_cap_is_not_a_chapter_reference() {
        let registry = registry();
        let text = "Everyone put on your cap. 2 teams race to the gate.";
        assert!(!registry.has_leak(text));
        assert!(kinds("ver el capítulo 4").contains(&PatternKind::Reference));
    }

    #[test]
    fn test_sanitize_preserves_paragraphs() {
        let registry = registry();
        assert_eq!(
            registry.sanitize("First clue.\n\nSecond clue."),
            "First clue.\n\nSecond clue."
        );
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let config = LeakPatternsConfig {
            pattern: vec![LeakPatternConfig {
                name: "broken".to_string(),
                kind: PatternKind::Url,
                pattern: "(unclosed".to_string(),
                sanitize: true,
                description: String::new(),
            }],
        };
        assert!(matches!(
            PatternRegistry::from_config(config),
            Err(HuntError::Config(_))
        ));
    }

    #[test]
    fn test_pattern_file_roundtrip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("leaks.toml");
        let content = r#"
            [[pattern]]
            name = "folio"
            kind = "reference"
            pattern = '(?i)\bfolio\s*\d+'
            sanitize = true
        "#;
        std::fs::write(&path, content).unwrap();

        let registry = PatternRegistry::from_config_file(&path).unwrap();
        assert_eq!(registry.leak_patterns.len(), 1);
        assert!(registry.has_leak("as noted on folio 9"));
        assert!(!registry.has_leak("according to the map"));
    }
}
