//! Relaxed JSON recovery for model output.
//!
//! Models wrap JSON in markdown fences, prepend chatter, stutter opening
//! braces, or emit object-literal syntax. [`decode`] tries a fixed ladder of
//! recovery strategies and returns the first structured value it finds.

pub mod lenient;

use serde_json::Value;
use thiserror::Error;

/// Number of leading characters of the cleaned text included in errors.
const DIAGNOSTIC_PREFIX_CHARS: usize = 30;

/// Raised when no recovery strategy produced a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Could not recover JSON from: {prefix}...")]
pub struct DecodeError {
    /// First characters of the cleaned input.
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    /// Arrays win only when a `[` appears before any `{`.
    fn detect(text: &str) -> Self {
        match (text.find('{'), text.find('[')) {
            (Some(brace), Some(bracket)) if bracket < brace => Container::Array,
            (None, Some(_)) => Container::Array,
            _ => Container::Object,
        }
    }

    fn open(self) -> char {
        match self {
            Container::Object => '{',
            Container::Array => '[',
        }
    }

    fn close(self) -> char {
        match self {
            Container::Object => '}',
            Container::Array => ']',
        }
    }
}

/// Recover a JSON value from free-form model text.
///
/// Strategies, in order:
/// 1. Strip markdown code fences and trim.
/// 2. Scan candidate windows from each opening delimiter to the last closing
///    delimiter and strict-parse each one.
/// 3. Collapse a stuttered opening (`{{ "a"` or `{ { "a"`) into a single `{`.
/// 4. Parse the widest delimiter window with the [`lenient`] parser.
pub fn decode(raw: &str) -> Result<Value, DecodeError> {
    let cleaned = strip_code_fences(raw);
    let text = cleaned.trim();
    let container = Container::detect(text);

    if let Some(value) = scan_windows(text, container) {
        return Ok(value);
    }
    if let Some(value) = repair_stutter(text) {
        tracing::debug!("Recovered JSON after collapsing stuttered braces");
        return Ok(value);
    }
    if let Some(value) = lenient_window(text, container) {
        tracing::debug!("Recovered JSON with lenient parser");
        return Ok(value);
    }

    Err(DecodeError {
        prefix: text.chars().take(DIAGNOSTIC_PREFIX_CHARS).collect(),
    })
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "")
}

fn scan_windows(text: &str, container: Container) -> Option<Value> {
    let end = text.rfind(container.close())?;
    let mut start = text.find(container.open());

    while let Some(s) = start {
        if s >= end {
            break;
        }
        match serde_json::from_str::<Value>(&text[s..=end]) {
            Ok(value) => return Some(value),
            Err(e) => {
                tracing::trace!(start = s, error = %e, "Candidate window rejected");
                start = text[s + 1..]
                    .find(container.open())
                    .map(|offset| s + 1 + offset);
            }
        }
    }
    None
}

fn repair_stutter(text: &str) -> Option<Value> {
    let rest = text.trim_start_matches(|c: char| c == '{' || c.is_whitespace());
    if rest.len() == text.len() || !rest.starts_with('"') {
        return None;
    }
    serde_json::from_str(&format!("{{{rest}")).ok()
}

fn lenient_window(text: &str, container: Container) -> Option<Value> {
    let start = text.find(container.open())?;
    let end = text.rfind(container.close())?;
    if end <= start {
        return None;
    }
    match lenient::parse(&text[start..=end]) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::trace!(error = %e, "Lenient parse failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_object() {
        let raw = "```json\n{\"a\":1}\n```";
        assert_eq!(decode(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_leading_chatter() {
        let raw = "Sure! Here you go: {\"question\":\"Q\",\"options\":[\"a\",\"b\",\"c\",\"d\"],\"correctIndex\":2}";
        let value = decode(raw).unwrap();
        assert_eq!(value["question"], "Q");
        assert_eq!(value["correctIndex"], 2);
    }

    #[test]
    fn test_stuttered_braces() {
        for raw in ["{{ \"a\": 1 }", "{ { \"a\": 1 }", "{ { { \"a\":1}", "{{{\"a\":1}"] {
            assert_eq!(decode(raw).unwrap(), json!({"a": 1}), "input: {raw}");
        }
    }

    #[test]
    fn test_noise_around_valid_json() {
        let value = json!({"question": "Q", "options": ["a", "b", "c", "d"], "correctIndex": 3});
        let body = value.to_string();
        let cases = [
            format!("Here: ```json\n{body}\n``` Hope this helps!"),
            format!("{body}\n\nLet me know if you want another one."),
            format!("```\n{body}\n```\nGood luck!"),
            format!("Sure thing.\n{body}\nThat is all."),
            format!("  \n```json{body}```  "),
        ];
        for raw in &cases {
            assert_eq!(decode(raw).unwrap(), value, "input: {raw}");
        }
    }

    #[test]
    fn test_array_before_object() {
        let raw = "[{\"name\":\"X\"},{\"name\":\"Y\"}]";
        let value = decode(raw).unwrap();
        assert_eq!(value, json!([{"name": "X"}, {"name": "Y"}]));
    }

    #[test]
    fn test_object_preferred_when_brace_first() {
        let raw = "{\"tiles\": [\"a\", \"b\"]}";
        assert_eq!(decode(raw).unwrap(), json!({"tiles": ["a", "b"]}));
    }

    #[test]
    fn test_later_window_found_after_bad_prefix() {
        let raw = "{oops} then the real one {\"ok\": true}";
        assert_eq!(decode(raw).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_lenient_fallback() {
        let raw = "{question: 'What?', options: ['a','b'], correctIndex: 1,}";
        let value = decode(raw).unwrap();
        assert_eq!(value["question"], "What?");
        assert_eq!(value["correctIndex"], 1);
    }

    #[test]
    fn test_error_prefix() {
        let err = decode("not json at all").unwrap_err();
        assert_eq!(err.prefix, "not json at all");
        assert_eq!(
            err.to_string(),
            "Could not recover JSON from: not json at all..."
        );
    }

    #[test]
    fn test_error_prefix_truncated_to_thirty_chars() {
        let raw = "x".repeat(80);
        let err = decode(&raw).unwrap_err();
        assert_eq!(err.prefix.chars().count(), 30);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(decode("").is_err());
        assert!(decode("```json\n```").is_err());
    }

    #[test]
    fn test_idempotent_on_valid_json() {
        let value = json!({"nested": {"list": [1, 2, {"deep": "yes"}]}, "n": -4});
        let once = decode(&value.to_string()).unwrap();
        assert_eq!(once, value);
        let twice = decode(&once.to_string()).unwrap();
        assert_eq!(twice, value);
    }
}
