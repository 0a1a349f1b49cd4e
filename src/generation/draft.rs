use crate::error::{HuntError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Structured puzzle returned by the text-generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleDraft {
    pub title: String,
    pub story: String,
    #[serde(default)]
    pub setup: String,
    pub steps: Vec<String>,
    pub solution: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub props: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub safety: Vec<String>,
}

impl PuzzleDraft {
    /// Parse model output into a draft
    ///
    /// Accepts the JSON object bare, inside a Markdown code fence, or with
    /// prose around it.
    pub fn parse(raw: &str) -> Result<Self> {
        let json = extract_json_object(raw)
            .ok_or_else(|| HuntError::MalformedDraft("No JSON object in response".to_string()))?;

        let draft: PuzzleDraft = serde_json::from_str(json)
            .map_err(|e| HuntError::MalformedDraft(format!("Invalid draft JSON: {}", e)))?;

        draft.check_required()?;
        Ok(draft)
    }

    fn check_required(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("story", &self.story),
            ("solution", &self.solution),
        ] {
            if value.trim().is_empty() {
                return Err(HuntError::MalformedDraft(format!("Field '{}' is empty", field)));
            }
        }
        if !self.steps.iter().any(|s| !s.trim().is_empty()) {
            return Err(HuntError::MalformedDraft("Draft has no steps".to_string()));
        }
        Ok(())
    }

    /// Text scored for originality: title, story, setup, steps, solution, hints
    ///
    /// Props and safety notes are practical lists and stay out of scoring.
    pub fn evaluation_text(&self) -> String {
        [
            self.title.as_str(),
            self.story.as_str(),
            self.setup.as_str(),
            &self.steps.join("\n"),
            self.solution.as_str(),
            &self.hints.join("\n"),
        ]
        .iter()
        .filter(|part| !part.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n")
    }
}

/// Slice from the first `{` to the last `}`
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) if s.trim().is_empty() => Vec::new(),
        StringOrList::One(s) => vec![s],
        StringOrList::Many(list) => list,
        StringOrList::Missing(()) => Vec::new(),
    })
}
