//! Oracle prompt for fact checking.
//!
//! The prompt pins the oracle to exactly three JSON shapes: the off-topic
//! sentinel, the belief/opinion sentinel, or a verdict object. The sentinel
//! explanations are the same constants `mochi-core` matches on, so the
//! off-topic fallback keeps working if the wording changes.

use mochi_core::{BELIEF_EXPLANATION, OFF_TOPIC_EXPLANATION};

/// Render the fact-check prompt for a claim.
///
/// Identical claims render identical prompts; the oracle's answers to them
/// may still differ.
pub fn fact_check_prompt(claim: &str) -> String {
    format!(
        r#"
You are a strict JSON API for checking facts about cats.

User statement (answer in the same language):
"{claim}"

RULES:

1) LANGUAGE
- Detect the language of the user statement.
- Answer in the SAME language as the user statement.

2) TOPIC FILTER (cats only)
- If the statement is NOT about cats (cats, tomcats, kittens, feline animals),
  then respond with this JSON and NOTHING ELSE:
  {{
    "verdict": "unknown",
    "confidence": 0,
    "explanation": "{off_topic}"
  }}

3) SUBJECTIVE / NON-FACTUAL STATEMENTS
- If the statement is about beliefs, opinions, religion, philosophy,
  or other claims that cannot be verified as factual (for example: "Cats are divine beings"),
  then respond with this JSON and NOTHING ELSE:
  {{
    "verdict": "unknown",
    "confidence": 0,
    "explanation": "{belief}"
  }}

4) NORMAL FACT-CHECK (cats only)
- If the statement IS about cats AND can be checked as a factual claim,
  respond with a JSON object:
  {{
    "verdict": "true" or "false" or "partial",
    "confidence": an integer from 0 to 100,
    "explanation": 1–2 short sentences explaining your verdict, in the same language as the statement
  }}

5) JSON FORMAT
- Output MUST be valid JSON.
- Do NOT add markdown, backticks, or extra text.
- Do NOT escape letters as \u0411\u043e... etc. Use normal human-readable text.
"#,
        claim = claim,
        off_topic = OFF_TOPIC_EXPLANATION,
        belief = BELIEF_EXPLANATION,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_embedded() {
        let prompt = fact_check_prompt("Cats have nine lives");
        assert!(prompt.contains("\"Cats have nine lives\""));
    }

    #[test]
    fn test_sentinels_match_core_constants() {
        let prompt = fact_check_prompt("anything");
        assert!(prompt.contains(&format!("\"explanation\": \"{}\"", OFF_TOPIC_EXPLANATION)));
        assert!(prompt.contains(&format!("\"explanation\": \"{}\"", BELIEF_EXPLANATION)));
    }

    #[test]
    fn test_format_rules_present() {
        let prompt = fact_check_prompt("anything");
        assert!(prompt.contains("Output MUST be valid JSON."));
        assert!(prompt.contains("Do NOT add markdown"));
        assert!(prompt.contains(r"\u0411\u043e"));
        assert!(prompt.contains("same language"));
        assert!(prompt.contains("an integer from 0 to 100"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(fact_check_prompt("Кошки"), fact_check_prompt("Кошки"));
    }

    #[test]
    fn test_braces_in_claim_survive() {
        let prompt = fact_check_prompt("{cats} are {{fluffy}}");
        assert!(prompt.contains("\"{cats} are {{fluffy}}\""));
    }
}
