//! Parsing of model output that should be JSON.

use mockmate_core::error::{MockmateError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)\s*```").expect("fence pattern is valid")
});

/// The contents of the first Markdown code fence, or the trimmed input when
/// there is none.
pub fn strip_code_fences(text: &str) -> &str {
    FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim()
}

/// Parses model output as `T`, tolerating a surrounding code fence.
pub fn parse_json<T: DeserializeOwned>(source_name: &str, text: &str) -> Result<T> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|err| {
        tracing::warn!(source = source_name, error = %err, "Model output is not the expected JSON");
        MockmateError::malformed(source_name, err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn strips_json_fence() {
        let text = "Here you go:\n```json\n{\"value\": 3}\n```\nThanks";
        assert_eq!(strip_code_fences(text), "{\"value\": 3}");
    }

    #[test]
    fn strips_bare_fence_and_passes_plain_text() {
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn parse_failure_is_malformed() {
        let err = parse_json::<Sample>("gemini", "not json").unwrap_err();
        assert!(err.is_malformed());
        let parsed: Sample = parse_json("gemini", "```json\n{\"value\": 7}\n```").unwrap();
        assert_eq!(parsed, Sample { value: 7 });
    }
}
