//! # mochi-core
//!
//! Deterministic building blocks for the Mochi fact checker.
//!
//! This crate answers one question: given the outputs of repeated calls to a
//! non-deterministic text oracle, is there an output we can accept?
//!
//! ## Key Guarantees
//!
//! 1. **Total parsing**: any oracle text becomes a fully populated [`VerdictRecord`]
//! 2. **No I/O**: no oracle calls, no storage, no clocks
//! 3. **Semantic agreement**: records agree on verdict bucket and confidence band,
//!    never on explanation wording
//! 4. **Stable fallback**: off-topic claims always map to the same fact
//!
//! ## Example
//!
//! ```rust
//! use mochi_core::{decide, parse_response, ConsensusOutcome, ConsensusPolicy, ExecutionAttempt, Role};
//!
//! let leader = ExecutionAttempt::answered(
//!     Role::Leader,
//!     r#"{"verdict":"false","confidence":80,"explanation":"Cats cannot fly."}"#,
//! );
//! let validator = ExecutionAttempt::answered(
//!     Role::Validator(0),
//!     r#"{"verdict":"partial","confidence":65,"explanation":"Not really."}"#,
//! );
//!
//! let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
//! assert!(matches!(outcome, ConsensusOutcome::Accepted(_)));
//! assert_eq!(parse_response("not json").confidence, 0);
//! ```

pub mod consensus;
pub mod equivalence;
pub mod fallback;
pub mod parser;
pub mod types;

// Re-export main types at crate root
pub use consensus::{
    decide, tally, ConsensusOutcome, ConsensusPolicy, ExecutionAttempt, PolicyError,
    RejectionReason, Role, Tally,
};
pub use equivalence::{
    confidence_close, verdicts_equivalent, DEFAULT_CONFIDENCE_TOLERANCE,
};
pub use fallback::{
    apply_fallback, fact_index, is_off_topic, pick_fact, CAT_FACTS, BELIEF_EXPLANATION,
    OFF_TOPIC_EXPLANATION,
};
pub use parser::{parse_reading, parse_response, strip_fences, Reading};
pub use types::{
    Verdict, VerdictBucket, VerdictRecord, NO_FACTS_CHECKED_JSON, PARSE_FAILURE_EXPLANATION,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_topic_claim_end_to_end() {
        let claim = "How do I bake sourdough bread?";
        let raw = "```json\n{\"verdict\":\"unknown\",\"confidence\":0,\"explanation\":\"The question is not about cats\"}\n```";

        let leader = ExecutionAttempt::answered(Role::Leader, raw);
        let validator = ExecutionAttempt::answered(Role::Validator(0), raw);

        let record = match decide(&leader, &[validator], &ConsensusPolicy::default()) {
            ConsensusOutcome::Accepted(record) => record,
            other => panic!("expected acceptance, got {:?}", other),
        };

        let record = apply_fallback(record, claim);
        assert_eq!(record.verdict, Verdict::Unknown);
        assert_eq!(record.confidence, 0);
        assert!(record.explanation.contains(CAT_FACTS[5]));
    }

    #[test]
    fn test_mutual_parse_failure_is_accepted() {
        let leader = ExecutionAttempt::answered(Role::Leader, "I think cats are great!");
        let validator = ExecutionAttempt::answered(Role::Validator(0), "<html>oops</html>");

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert_eq!(
            outcome,
            ConsensusOutcome::Accepted(VerdictRecord::parse_failure())
        );
    }
}
