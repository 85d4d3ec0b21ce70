//! Fallback for claims the oracle judged off-topic.
//!
//! The replacement fact is chosen from the claim text, never from oracle
//! output, so the same claim always gets the same fact no matter which
//! execution produced the off-topic answer.

use sha2::{Digest, Sha256};

use crate::types::{Verdict, VerdictRecord};

/// Explanation the oracle is instructed to give for claims that are not about cats.
pub const OFF_TOPIC_EXPLANATION: &str = "the question is not about cats";

/// Explanation the oracle is instructed to give for beliefs and opinions.
pub const BELIEF_EXPLANATION: &str =
    "this statement is a matter of belief or opinion and cannot be checked as a factual claim";

/// Facts offered in place of an answer to an off-topic claim.
pub const CAT_FACTS: [&str; 10] = [
    "Cats can jump up to six times their length.",
    "A group of cats is called a clowder.",
    "Cats sleep for around 70% of their lives.",
    "Each cat’s nose print is unique, like a human fingerprint.",
    "Cats can make over 100 different vocal sounds.",
    "The first cat in space was a French cat named Félicette in 1963.",
    "Most cats have 18 toes: five on each front paw and four on each back paw.",
    "Cats can rotate their ears 180 degrees using over 30 different muscles.",
    "Domestic cats share about 95% of their DNA with tigers.",
    "Cats use their whiskers to judge whether they can fit through a space.",
];

/// Index into [`CAT_FACTS`] for a claim.
///
/// The SHA-256 digest of the claim is read as a big-endian integer and
/// reduced modulo the table length.
pub fn fact_index(claim: &str) -> usize {
    let digest = Sha256::digest(claim.as_bytes());
    let len = CAT_FACTS.len() as u64;

    let index = digest
        .iter()
        .fold(0u64, |acc, &byte| (acc * 256 + u64::from(byte)) % len);
    index as usize
}

/// The fact a claim maps to.
pub fn pick_fact(claim: &str) -> &'static str {
    CAT_FACTS[fact_index(claim)]
}

/// Whether a record is the oracle's off-topic answer.
pub fn is_off_topic(record: &VerdictRecord) -> bool {
    record.verdict == Verdict::Unknown
        && record.confidence == 0
        && record
            .explanation
            .to_lowercase()
            .contains(OFF_TOPIC_EXPLANATION)
}

/// Replace an off-topic explanation with a fact chosen from the claim.
///
/// Verdict and confidence are kept. Records that are not off-topic pass
/// through untouched.
pub fn apply_fallback(mut record: VerdictRecord, claim: &str) -> VerdictRecord {
    if !is_off_topic(&record) {
        return record;
    }

    let index = fact_index(claim);
    tracing::debug!(fact_index = index, "Off-topic claim, substituting fallback fact");

    record.explanation = format!(
        "Mochi cannot answer your question about this topic, \
         but here is an interesting fact about cats: {}",
        CAT_FACTS[index]
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn off_topic(explanation: &str) -> VerdictRecord {
        VerdictRecord::new(Verdict::Unknown, 0, explanation)
    }

    #[test]
    fn test_known_indices() {
        // sha256("abc") = ba7816bf...15ad, which is 5 mod 10
        assert_eq!(fact_index("abc"), 5);
        assert_eq!(fact_index(""), 9);
        assert_eq!(fact_index("How do I bake sourdough bread?"), 5);
        assert_eq!(fact_index("The stock market closed higher today"), 6);
        assert_eq!(fact_index("Кошки умеют летать"), 4);
    }

    #[test]
    fn test_fallback_rewrites_explanation_only() {
        let claim = "The stock market closed higher today";
        let record = apply_fallback(off_topic("The question is NOT about cats."), claim);

        assert_eq!(record.verdict, Verdict::Unknown);
        assert_eq!(record.confidence, 0);
        assert_eq!(
            record.explanation,
            "Mochi cannot answer your question about this topic, but here is an \
             interesting fact about cats: Most cats have 18 toes: five on each front \
             paw and four on each back paw."
        );
    }

    #[test]
    fn test_fallback_requires_all_trigger_conditions() {
        let claim = "abc";

        let confident = VerdictRecord::new(Verdict::Unknown, 10, OFF_TOPIC_EXPLANATION);
        assert_eq!(apply_fallback(confident.clone(), claim), confident);

        let decided = VerdictRecord::new(Verdict::False, 0, OFF_TOPIC_EXPLANATION);
        assert_eq!(apply_fallback(decided.clone(), claim), decided);

        let belief = off_topic(BELIEF_EXPLANATION);
        assert_eq!(apply_fallback(belief.clone(), claim), belief);

        let sentinel = VerdictRecord::parse_failure();
        assert_eq!(apply_fallback(sentinel.clone(), claim), sentinel);
    }

    #[test]
    fn test_fallback_is_independent_of_oracle_wording() {
        let claim = "Is Paris the capital of France?";
        let a = apply_fallback(off_topic("the question is not about cats"), claim);
        let b = apply_fallback(off_topic("Sorry: The Question Is Not About Cats!"), claim);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pick_fact() {
        assert_eq!(pick_fact("abc"), CAT_FACTS[5]);
    }

    proptest! {
        #[test]
        fn prop_fact_index_is_stable_and_in_range(claim in ".*") {
            let first = fact_index(&claim);
            prop_assert!(first < CAT_FACTS.len());
            prop_assert_eq!(first, fact_index(&claim));
        }
    }
}
