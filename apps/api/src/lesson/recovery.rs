//! Output Recovery Pipeline — converts untrusted model output into a
//! `LessonDocument`, maximizing the chance of valid structured output.
//!
//! An ordered list of pure `&str -> Option<Value>` attempts, composed
//! first-success-wins. Earlier attempts are less destructive; the newline
//! escaping in the last one can corrupt legitimately multiline string values,
//! so it runs only when everything gentler has failed. The pipeline is total:
//! it never panics and never returns a partial type.

use serde::Serialize;
use serde_json::{json, Value};

/// Error marker carried by a terminal recovery failure.
pub const INVALID_OUTPUT_ERROR: &str = "El modelo no devolvió un JSON válido";

/// The result of recovering one model completion: either a parsed lesson
/// document or an explicit, diagnosable failure. Never silently one or the
/// other — callers must match.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LessonDocument {
    Lesson(Value),
    Invalid {
        error: String,
        raw: String,
        /// Best candidate produced by boundary extraction / normalization,
        /// kept for diagnostics.
        candidate: Option<String>,
    },
}

impl LessonDocument {
    pub fn is_lesson(&self) -> bool {
        matches!(self, LessonDocument::Lesson(_))
    }

    /// The wire shape returned to the caller and written to the log:
    /// the document itself on success, an error object on failure.
    pub fn into_payload(self) -> Value {
        match self {
            LessonDocument::Lesson(doc) => doc,
            LessonDocument::Invalid {
                error,
                raw,
                candidate,
            } => json!({
                "error": error,
                "raw": raw,
                "candidate": candidate,
            }),
        }
    }
}

type Attempt = fn(&str) -> Option<Value>;

/// Recovery attempts in order of increasing aggressiveness.
const ATTEMPTS: &[Attempt] = &[
    attempt_direct,
    attempt_fenced,
    attempt_braced,
    attempt_normalized,
];

/// Recovers a structured lesson document from raw model output.
/// Total over all strings; the terminal failure keeps the raw output verbatim.
pub fn recover_lesson(raw: &str) -> LessonDocument {
    let trimmed = raw.trim();

    for attempt in ATTEMPTS {
        if let Some(document) = attempt(trimmed) {
            return LessonDocument::Lesson(document);
        }
    }

    LessonDocument::Invalid {
        error: INVALID_OUTPUT_ERROR.to_string(),
        raw: raw.to_string(),
        candidate: best_candidate(trimmed),
    }
}

/// Attempt 1: parse the trimmed output as-is.
fn attempt_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Attempt 2: strip one layer of ``` / ```json fences and reparse.
fn attempt_fenced(text: &str) -> Option<Value> {
    attempt_direct(strip_json_fences(text))
}

/// Attempt 3: extract the first-`{` to last-`}` substring and reparse.
fn attempt_braced(text: &str) -> Option<Value> {
    attempt_direct(extract_braced(text)?)
}

/// Attempt 4: aggressively normalize the braced candidate and reparse.
fn attempt_normalized(text: &str) -> Option<Value> {
    attempt_direct(&normalize_candidate(extract_braced(text)?))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the substring spanning the first `{` through the last `}`,
/// if both exist in that order.
fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Strips one layer of surrounding quotes and escapes raw newlines so the
/// parser does not choke on unescaped control characters inside string values.
fn normalize_candidate(candidate: &str) -> String {
    let candidate = candidate.trim();
    let candidate = candidate
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            candidate
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        })
        .unwrap_or(candidate);

    candidate.replace('\r', "").replace('\n', "\\n")
}

/// The best cleaned candidate for the terminal error document.
fn best_candidate(text: &str) -> Option<String> {
    extract_braced(text).map(normalize_candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_parse_of_valid_json() {
        let result = recover_lesson(r#"{"tema": "Fracciones", "horasClase": 2}"#);
        match result {
            LessonDocument::Lesson(doc) => {
                assert_eq!(doc["tema"], "Fracciones");
                assert_eq!(doc["horasClase"], 2);
            }
            LessonDocument::Invalid { .. } => panic!("expected a parsed document"),
        }
    }

    #[test]
    fn test_fenced_json_is_recovered() {
        let result = recover_lesson("```json\n{\"tema\":\"x\"}\n```");
        assert_eq!(result, LessonDocument::Lesson(json!({"tema": "x"})));
    }

    #[test]
    fn test_fence_without_format_tag_is_recovered() {
        let result = recover_lesson("```\n{\"tema\":\"x\"}\n```");
        assert_eq!(result, LessonDocument::Lesson(json!({"tema": "x"})));
    }

    #[test]
    fn test_fence_stripping_is_idempotent_in_result() {
        let bare = recover_lesson(r#"{"a": 1}"#);
        let fenced = recover_lesson("```json\n{\"a\": 1}\n```");
        assert_eq!(bare, fenced);
    }

    #[test]
    fn test_prose_wrapped_json_is_boundary_extracted() {
        let result = recover_lesson("Sure! Here you go: {\"a\":1} Hope that helps");
        assert_eq!(result, LessonDocument::Lesson(json!({"a": 1})));
    }

    #[test]
    fn test_raw_newlines_inside_strings_are_escaped() {
        let result = recover_lesson("{\"inicio\": \"Saludo\ny repaso\"}");
        assert_eq!(result, LessonDocument::Lesson(json!({"inicio": "Saludo\ny repaso"})));
    }

    #[test]
    fn test_quoted_candidate_has_one_quote_layer_stripped() {
        // No braces outside the quotes, so boundary extraction yields the
        // inner object; the surrounding quotes never survive to parsing.
        let result = recover_lesson("\"{\"a\": 1}\"");
        assert_eq!(result, LessonDocument::Lesson(json!({"a": 1})));
    }

    #[test]
    fn test_garbage_yields_terminal_error_with_raw_verbatim() {
        let raw = "not json at all";
        match recover_lesson(raw) {
            LessonDocument::Invalid {
                error,
                raw: kept,
                candidate,
            } => {
                assert_eq!(error, INVALID_OUTPUT_ERROR);
                assert_eq!(kept, raw);
                assert_eq!(candidate, None);
            }
            LessonDocument::Lesson(_) => panic!("garbage must not parse"),
        }
    }

    #[test]
    fn test_empty_string_is_terminal_error() {
        assert!(!recover_lesson("").is_lesson());
    }

    #[test]
    fn test_binary_garbage_never_panics() {
        let result = recover_lesson("\u{0}\u{1}\u{fffd}{{{}}}");
        // Totality is the property under test; either variant is acceptable.
        let _ = result.into_payload();
    }

    #[test]
    fn test_unclosable_braces_keep_best_candidate_for_diagnostics() {
        match recover_lesson("prefix {\"a\": } suffix") {
            LessonDocument::Invalid { candidate, .. } => {
                assert_eq!(candidate.as_deref(), Some("{\"a\": }"));
            }
            LessonDocument::Lesson(_) => panic!("malformed object must not parse"),
        }
    }

    #[test]
    fn test_round_trip_of_serialized_document() {
        let document = json!({
            "tema": "Fracciones",
            "secuenciaMetodologica": {"inicio": "a", "desarrollo": "b", "cierre": "c"},
            "procesosDidacticos": ["uno", "dos"],
        });
        let serialized = serde_json::to_string(&document).unwrap();
        assert_eq!(recover_lesson(&serialized), LessonDocument::Lesson(document));
    }

    #[test]
    fn test_error_payload_wire_shape() {
        let payload = recover_lesson("nada").into_payload();
        assert_eq!(payload["error"], INVALID_OUTPUT_ERROR);
        assert_eq!(payload["raw"], "nada");
        assert!(payload["candidate"].is_null());
    }

    #[test]
    fn test_success_payload_is_the_document_itself() {
        let payload = recover_lesson(r#"{"tema": "x"}"#).into_payload();
        assert_eq!(payload, json!({"tema": "x"}));
    }

    #[test]
    fn test_extract_braced_requires_ordered_pair() {
        assert_eq!(extract_braced("} nothing {"), None);
        assert_eq!(extract_braced("no braces"), None);
        assert_eq!(extract_braced("a {b} c"), Some("{b}"));
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        assert_eq!(strip_json_fences("{\"key\": \"value\"}"), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_normalize_strips_single_quote_layer() {
        assert_eq!(normalize_candidate("'{\"a\":1}'"), "{\"a\":1}");
        assert_eq!(normalize_candidate("\"{}\""), "{}");
    }
}
