//! Oracle response parsing.
//!
//! Oracle text is untrusted. It may be wrapped in markdown fences, may not be
//! JSON at all, and may omit or mistype fields. [`parse_response`] never fails:
//! anything it cannot decode becomes the parse-failure sentinel, and anything it
//! can decode is normalized into a fully populated [`VerdictRecord`].
//!
//! Normalization fills a missing confidence with 0, so [`parse_reading`] also
//! keeps the raw numeric reading for agreement checks.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::types::{Verdict, VerdictRecord, MAX_CONFIDENCE};

lazy_static! {
    /// Markdown fence markers, with or without a `json` language tag.
    static ref FENCE_PATTERN: Regex = Regex::new(r"```(?:json)?").unwrap();
}

/// Remove markdown fence markers and surrounding whitespace.
pub fn strip_fences(raw: &str) -> String {
    FENCE_PATTERN.replace_all(raw, "").trim().to_string()
}

/// A normalized record plus the confidence the oracle actually gave.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub record: VerdictRecord,

    /// Unclamped numeric confidence; `None` when missing or not a number.
    /// The parse-failure sentinel reads as `Some(0)`.
    pub confidence: Option<i64>,
}

impl Reading {
    fn parse_failure() -> Self {
        Self {
            record: VerdictRecord::parse_failure(),
            confidence: Some(0),
        }
    }
}

/// Parse raw oracle text into a verdict record.
///
/// Returns [`VerdictRecord::parse_failure`] when the cleaned text is not a
/// JSON object.
pub fn parse_response(raw: &str) -> VerdictRecord {
    parse_reading(raw).record
}

/// Like [`parse_response`], keeping the raw confidence reading.
pub fn parse_reading(raw: &str) -> Reading {
    let cleaned = strip_fences(raw);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(fields)) => normalize(&fields),
        Ok(other) => {
            tracing::debug!(kind = json_kind(&other), "Oracle returned non-object JSON");
            Reading::parse_failure()
        }
        Err(e) => {
            tracing::debug!(raw_len = raw.len(), error = %e, "Oracle returned undecodable text");
            Reading::parse_failure()
        }
    }
}

/// Turn a decoded object into a typed record, defaulting every missing field.
fn normalize(fields: &Map<String, Value>) -> Reading {
    let verdict = match fields.get("verdict") {
        Some(Value::String(label)) => Verdict::from_label(label).unwrap_or_else(|| {
            tracing::debug!(label = %label, "Unrecognized verdict label, using unknown");
            Verdict::Unknown
        }),
        _ => Verdict::Unknown,
    };

    let explanation = fields
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let confidence = read_confidence(fields.get("confidence"));
    if confidence.is_none() {
        tracing::debug!("Confidence missing or not a number");
    }

    Reading {
        record: VerdictRecord {
            verdict,
            confidence: clamp_confidence(confidence),
            explanation,
        },
        confidence,
    }
}

/// Numeric confidence as given, floats rounded.
fn read_confidence(value: Option<&Value>) -> Option<i64> {
    let Some(Value::Number(n)) = value else {
        return None;
    };

    if let Some(i) = n.as_i64() {
        Some(i)
    } else if n.as_u64().is_some() {
        // Only integers above i64::MAX land here.
        Some(i64::MAX)
    } else {
        // Float to int casts saturate.
        n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)
    }
}

fn clamp_confidence(reading: Option<i64>) -> u8 {
    reading.map_or(0, |i| i.clamp(0, i64::from(MAX_CONFIDENCE)) as u8)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_object() {
        let record = parse_response(
            r#"{"verdict": "true", "confidence": 92, "explanation": "Cats do sleep a lot."}"#,
        );
        assert_eq!(record, VerdictRecord::new(Verdict::True, 92, "Cats do sleep a lot."));
    }

    #[test]
    fn test_malformed_text_yields_sentinel() {
        let record = parse_response("not json at all");
        assert_eq!(record.verdict, Verdict::Unknown);
        assert_eq!(record.confidence, 0);
        assert_eq!(record.explanation, "Failed to parse response");
    }

    #[test]
    fn test_non_object_json_yields_sentinel() {
        assert!(parse_response("[1, 2, 3]").is_parse_failure());
        assert!(parse_response("\"true\"").is_parse_failure());
        assert!(parse_response("42").is_parse_failure());
        assert!(parse_response("null").is_parse_failure());
        assert!(parse_response("").is_parse_failure());
    }

    #[test]
    fn test_fenced_output_parses_like_unfenced() {
        let body = r#"{"verdict":"false","confidence":70,"explanation":"No."}"#;
        let fenced = format!("```json\n{}\n```", body);
        let bare_fence = format!("  ```\n{}\n```  ", body);

        assert_eq!(parse_response(&fenced), parse_response(body));
        assert_eq!(parse_response(&bare_fence), parse_response(body));
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("\n\t{}  "), "{}");
        assert_eq!(strip_fences("no fences"), "no fences");
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let record = parse_response("{}");
        assert_eq!(record, VerdictRecord::new(Verdict::Unknown, 0, ""));
        assert!(!record.is_parse_failure());
    }

    #[test]
    fn test_untrusted_verdict_labels() {
        assert_eq!(parse_response(r#"{"verdict":"TRUE"}"#).verdict, Verdict::True);
        assert_eq!(
            parse_response(r#"{"verdict":"mostly true"}"#).verdict,
            Verdict::Unknown
        );
        assert_eq!(parse_response(r#"{"verdict":true}"#).verdict, Verdict::Unknown);
        assert_eq!(parse_response(r#"{"verdict":null}"#).verdict, Verdict::Unknown);
    }

    #[test]
    fn test_confidence_normalization() {
        let confidence = |raw: &str| parse_response(raw).confidence;

        assert_eq!(confidence(r#"{"confidence": 85}"#), 85);
        assert_eq!(confidence(r#"{"confidence": 84.6}"#), 85);
        assert_eq!(confidence(r#"{"confidence": -5}"#), 0);
        assert_eq!(confidence(r#"{"confidence": 140}"#), 100);
        assert_eq!(confidence(r#"{"confidence": 18446744073709551615}"#), 100);
        assert_eq!(confidence(r#"{"confidence": "85"}"#), 0);
        assert_eq!(confidence(r#"{"confidence": null}"#), 0);
        assert_eq!(confidence(r#"{"confidence": [85]}"#), 0);
    }

    #[test]
    fn test_reading_keeps_raw_confidence() {
        let reading = |raw: &str| parse_reading(raw).confidence;

        assert_eq!(reading(r#"{"confidence": 85}"#), Some(85));
        assert_eq!(reading(r#"{"confidence": 84.6}"#), Some(85));
        assert_eq!(reading(r#"{"confidence": 140}"#), Some(140));
        assert_eq!(reading(r#"{"confidence": -5}"#), Some(-5));
        assert_eq!(reading(r#"{"confidence": "high"}"#), None);
        assert_eq!(reading(r#"{"confidence": null}"#), None);
        assert_eq!(reading(r#"{"verdict": "true"}"#), None);
    }

    #[test]
    fn test_sentinel_reading_is_numeric() {
        let reading = parse_reading("not json at all");
        assert!(reading.record.is_parse_failure());
        assert_eq!(reading.confidence, Some(0));
    }

    #[test]
    fn test_non_string_explanation_is_empty() {
        let record = parse_response(r#"{"verdict":"true","confidence":90,"explanation":{"a":1}}"#);
        assert_eq!(record.explanation, "");
    }

    #[test]
    fn test_non_ascii_explanation_survives() {
        let record = parse_response(
            r#"{"verdict":"false","confidence":95,"explanation":"Кошки не умеют летать."}"#,
        );
        assert_eq!(record.explanation, "Кошки не умеют летать.");
    }
}
