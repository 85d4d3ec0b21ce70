//! Verdict data model shared by every stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Explanation carried by the sentinel record when oracle output cannot be decoded.
pub const PARSE_FAILURE_EXPLANATION: &str = "Failed to parse response";

/// Stored verdict returned before any claim has been checked.
pub const NO_FACTS_CHECKED_JSON: &str =
    r#"{"verdict":"unknown","confidence":0,"explanation":"No facts checked yet"}"#;

/// Highest confidence a record can carry.
pub const MAX_CONFIDENCE: u8 = 100;

/// Verdict label produced by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The claim holds
    True,

    /// The claim does not hold
    False,

    /// The claim holds only in part
    Partial,

    /// Off-topic, unverifiable, or unreadable
    #[default]
    Unknown,
}

impl Verdict {
    /// Every label, in declaration order.
    pub const ALL: [Verdict; 4] = [
        Verdict::True,
        Verdict::False,
        Verdict::Partial,
        Verdict::Unknown,
    ];

    /// Wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::False => "false",
            Verdict::Partial => "partial",
            Verdict::Unknown => "unknown",
        }
    }

    /// Match an untrusted label, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything outside the label set.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Verdict::True),
            "false" => Some(Verdict::False),
            "partial" => Some(Verdict::Partial),
            "unknown" => Some(Verdict::Unknown),
            _ => None,
        }
    }

    /// The equivalence class this label falls into.
    ///
    /// `False` and `Partial` share the [`VerdictBucket::NotTrue`] bucket.
    pub fn bucket(&self) -> VerdictBucket {
        match self {
            Verdict::True => VerdictBucket::True,
            Verdict::False | Verdict::Partial => VerdictBucket::NotTrue,
            Verdict::Unknown => VerdictBucket::Unknown,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equivalence class of a verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictBucket {
    True,
    NotTrue,
    Unknown,
}

/// A fully populated verdict.
///
/// Field order is the wire order: `verdict`, `confidence`, `explanation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// Verdict label
    pub verdict: Verdict,

    /// Confidence in [0, 100]
    pub confidence: u8,

    /// Human-readable explanation, in the claim's language
    pub explanation: String,
}

impl VerdictRecord {
    /// Create a record, clamping confidence to 100.
    pub fn new(verdict: Verdict, confidence: u8, explanation: impl Into<String>) -> Self {
        Self {
            verdict,
            confidence: confidence.min(MAX_CONFIDENCE),
            explanation: explanation.into(),
        }
    }

    /// The sentinel record for undecodable oracle output.
    pub fn parse_failure() -> Self {
        Self::new(Verdict::Unknown, 0, PARSE_FAILURE_EXPLANATION)
    }

    /// Whether this is the parse-failure sentinel.
    pub fn is_parse_failure(&self) -> bool {
        *self == Self::parse_failure()
    }

    /// Encode as compact JSON with non-ASCII text left unescaped.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a stored record.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for VerdictRecord {
    fn default() -> Self {
        Self::new(Verdict::Unknown, 0, "")
    }
}
