use super::GenerationRequest;

/// System instruction sent with every draft request
pub const SYSTEM_PROMPT: &str = "\
You design treasure-hunt and escape-room puzzles. Reference material may have \
inspired the request, but you must never copy it: do not reuse sentences, \
phrases, character names, place names or puzzle structure from any existing \
work. Write a complete rewrite that honours the requested theme.

Never cite, name or allude to any source. Do not mention books, websites, \
platforms, authors, chapters or pages, and do not use phrases such as \
\"according to\" or \"source:\".

Respond with a single JSON object and nothing else, using exactly these fields:
{\"title\": string, \"story\": string, \"setup\": string, \"steps\": [string], \
\"solution\": string, \"hints\": [string], \"props\": [string], \"safety\": string}";

/// User instruction for one attempt
///
/// A style hint, when present, takes the place of the requested tone.
pub fn user_prompt(request: &GenerationRequest, style_hint: Option<&str>) -> String {
    let tone = style_hint.unwrap_or(&request.tone);
    let materials = if request.materials.is_empty() {
        "whatever is commonly at hand".to_string()
    } else {
        request.materials.join(", ")
    };

    format!(
        "Create an original puzzle.\n\
         Theme: {}\n\
         Mechanic: {}\n\
         Scene: {}\n\
         Tone: {}\n\
         Difficulty: {} of 5\n\
         Available materials: {}\n\
         Target duration: {} minutes",
        request.theme,
        request.mechanic,
        request.scene,
        tone,
        request.difficulty,
        materials,
        request.duration_minutes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            theme: "sunken lighthouse".to_string(),
            mechanic: "cipher wheel".to_string(),
            scene: "scene-3".to_string(),
            tone: "eerie".to_string(),
            difficulty: 3,
            materials: vec!["rope".to_string(), "chalk".to_string()],
            duration_minutes: 20,
        }
    }

    #[test]
    fn test_user_prompt_fields() {
        let prompt = user_prompt(&request(), None);
        assert!(prompt.contains("Mechanic: cipher wheel"));
        assert!(prompt.contains("Scene: scene-3"));
        assert!(prompt.contains("Tone: eerie"));
        assert!(prompt.contains("Difficulty: 3 of 5"));
        assert!(prompt.contains("Available materials: rope, chalk"));
        assert!(prompt.contains("Target duration: 20 minutes"));
    }

    #[test]
    fn test_style_hint_replaces_tone() {
        let prompt = user_prompt(&request(), Some("more metaphorical"));
        assert!(prompt.contains("Tone: more metaphorical"));
        assert!(!prompt.contains("eerie"));
    }

    #[test]
    fn test_system_prompt_demands_json_fields() {
        for field in ["title", "story", "setup", "steps", "solution", "hints", "props", "safety"] {
            assert!(SYSTEM_PROMPT.contains(&format!("\"{}\"", field)));
        }
        assert!(SYSTEM_PROMPT.contains("never copy"));
    }
}
