//! Consensus decision: fan-in of one leader and N validator executions.
//!
//! The decision rules are strict:
//! 1. If the leader produced no record → REJECTED (leader failed)
//! 2. If at least `quorum` validators agree with the leader → ACCEPTED with the
//!    leader's record, unchanged
//! 3. Else if failures alone made the quorum unreachable → REJECTED (validators failed)
//! 4. Else → REJECTED (disagreement)
//!
//! Running the executions is a runtime concern; this module only decides.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::equivalence::{confidence_close, verdicts_equivalent, DEFAULT_CONFIDENCE_TOLERANCE};
use crate::parser::parse_reading;
use crate::types::VerdictRecord;

/// Errors from consensus policy validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("At least one validator is required")]
    NoValidators,

    #[error("Quorum {quorum} is outside 1..={validators}")]
    QuorumOutOfRange { quorum: usize, validators: usize },
}

/// How many validators run and how many must agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusPolicy {
    /// Validator executions per round
    pub validators: usize,

    /// Agreeing validators required for acceptance
    pub quorum: usize,

    /// Confidence distance tolerated between leader and validator
    pub confidence_tolerance: u8,
}

impl Default for ConsensusPolicy {
    /// One validator, unanimity required.
    fn default() -> Self {
        Self {
            validators: 1,
            quorum: 1,
            confidence_tolerance: DEFAULT_CONFIDENCE_TOLERANCE,
        }
    }
}

impl ConsensusPolicy {
    /// Create a validated policy with the default tolerance.
    pub fn new(validators: usize, quorum: usize) -> Result<Self, PolicyError> {
        let policy = Self {
            validators,
            quorum,
            ..Default::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Every validator must agree.
    pub fn unanimous(validators: usize) -> Result<Self, PolicyError> {
        Self::new(validators, validators)
    }

    /// Set the confidence tolerance.
    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.confidence_tolerance = tolerance;
        self
    }

    /// Check the validator count and quorum.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.validators == 0 {
            return Err(PolicyError::NoValidators);
        }
        if self.quorum == 0 || self.quorum > self.validators {
            return Err(PolicyError::QuorumOutOfRange {
                quorum: self.quorum,
                validators: self.validators,
            });
        }
        Ok(())
    }
}

/// Which side of the protocol an execution belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Leader,
    Validator(usize),
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Leader => write!(f, "leader"),
            Role::Validator(i) => write!(f, "validator[{}]", i),
        }
    }
}

/// One oracle round-trip and what came of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionAttempt {
    /// Leader or validator
    pub role: Role,

    /// Raw oracle text, if the oracle answered
    pub raw: Option<String>,

    /// Parsed record, if the oracle answered
    pub record: Option<VerdictRecord>,

    /// Confidence as the oracle gave it, before defaulting; `None` when the
    /// oracle did not answer or gave no numeric confidence
    pub confidence: Option<i64>,

    /// Failure description, if the oracle did not answer
    pub failure: Option<String>,
}

impl ExecutionAttempt {
    /// The oracle answered; parse its text.
    pub fn answered(role: Role, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let reading = parse_reading(&raw);
        Self {
            role,
            raw: Some(raw),
            record: Some(reading.record),
            confidence: reading.confidence,
            failure: None,
        }
    }

    /// The oracle call errored or timed out.
    pub fn failed(role: Role, reason: impl fmt::Display) -> Self {
        Self {
            role,
            raw: None,
            record: None,
            confidence: None,
            failure: Some(reason.to_string()),
        }
    }

    /// Whether the oracle answered.
    pub fn succeeded(&self) -> bool {
        self.record.is_some()
    }

    /// Whether this answer corroborates `leader`'s.
    ///
    /// Compares the raw confidence readings, so an answer without a numeric
    /// confidence never corroborates and is never corroborated.
    pub fn corroborates(&self, leader: &ExecutionAttempt, tolerance: u8) -> bool {
        match (&leader.record, &self.record) {
            (Some(expected), Some(actual)) => {
                verdicts_equivalent(expected.verdict, actual.verdict)
                    && confidence_close(leader.confidence, self.confidence, tolerance)
            }
            _ => false,
        }
    }
}

/// Why a round produced no accepted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The leader execution failed
    LeaderFailed,

    /// Too few validators answered to reach quorum
    ValidatorsFailed,

    /// Validators answered but did not corroborate the leader
    Disagreement,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::LeaderFailed => write!(f, "leader execution failed"),
            RejectionReason::ValidatorsFailed => write!(f, "too many validator executions failed"),
            RejectionReason::Disagreement => write!(f, "validators disagreed with the leader"),
        }
    }
}

/// Result of one consensus round.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsensusOutcome {
    Accepted(VerdictRecord),
    Rejected(RejectionReason),
}

impl ConsensusOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConsensusOutcome::Accepted(_))
    }

    /// The accepted record, if any.
    pub fn record(&self) -> Option<&VerdictRecord> {
        match self {
            ConsensusOutcome::Accepted(record) => Some(record),
            ConsensusOutcome::Rejected(_) => None,
        }
    }
}

/// Validator vote counts for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub agreeing: usize,
    pub disagreeing: usize,
    pub failed: usize,
}

/// Count how validators voted on the leader's record.
///
/// With no leader record every validator counts as failed.
pub fn tally(leader: &ExecutionAttempt, validators: &[ExecutionAttempt], tolerance: u8) -> Tally {
    let mut tally = Tally::default();

    if !leader.succeeded() {
        tally.failed = validators.len();
        return tally;
    }

    for validator in validators {
        if !validator.succeeded() {
            tally.failed += 1;
        } else if validator.corroborates(leader, tolerance) {
            tally.agreeing += 1;
        } else {
            tally.disagreeing += 1;
        }
    }

    tally
}

/// Decide a round.
///
/// Validators missing from `validators` (fewer than `policy.validators`) count
/// as failed.
pub fn decide(
    leader: &ExecutionAttempt,
    validators: &[ExecutionAttempt],
    policy: &ConsensusPolicy,
) -> ConsensusOutcome {
    let Some(leader_record) = leader.record.as_ref() else {
        return ConsensusOutcome::Rejected(RejectionReason::LeaderFailed);
    };

    let votes = tally(leader, validators, policy.confidence_tolerance);

    if votes.agreeing >= policy.quorum {
        return ConsensusOutcome::Accepted(leader_record.clone());
    }

    let answered = votes.agreeing + votes.disagreeing;
    if answered < policy.quorum && votes.disagreeing == 0 {
        ConsensusOutcome::Rejected(RejectionReason::ValidatorsFailed)
    } else {
        ConsensusOutcome::Rejected(RejectionReason::Disagreement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;

    fn answer(role: Role, verdict: &str, confidence: u8, explanation: &str) -> ExecutionAttempt {
        ExecutionAttempt::answered(
            role,
            format!(
                r#"{{"verdict":"{}","confidence":{},"explanation":"{}"}}"#,
                verdict, confidence, explanation
            ),
        )
    }

    #[test]
    fn test_not_true_bucket_accepts_leader_record() {
        let leader = answer(Role::Leader, "false", 80, "X");
        let validator = answer(Role::Validator(0), "partial", 65, "Y");

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert_eq!(
            outcome,
            ConsensusOutcome::Accepted(VerdictRecord::new(Verdict::False, 80, "X"))
        );
    }

    #[test]
    fn test_true_vs_false_rejected() {
        let leader = answer(Role::Leader, "true", 90, "Yes");
        let validator = answer(Role::Validator(0), "false", 90, "No");

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert_eq!(outcome, ConsensusOutcome::Rejected(RejectionReason::Disagreement));
    }

    #[test]
    fn test_confidence_drift_rejected() {
        let leader = answer(Role::Leader, "true", 90, "Yes");
        let validator = answer(Role::Validator(0), "true", 69, "Yes");

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn test_non_numeric_confidence_rejected() {
        let raw = r#"{"verdict":"true","confidence":"high","explanation":"Yes"}"#;
        let leader = ExecutionAttempt::answered(Role::Leader, raw);
        let validator = ExecutionAttempt::answered(Role::Validator(0), raw);

        assert_eq!(leader.record.as_ref().map(|r| r.confidence), Some(0));
        assert_eq!(leader.confidence, None);

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert_eq!(outcome, ConsensusOutcome::Rejected(RejectionReason::Disagreement));
    }

    #[test]
    fn test_missing_confidence_rejected() {
        let leader = ExecutionAttempt::answered(Role::Leader, r#"{"verdict":"false","explanation":"a"}"#);
        let validator =
            ExecutionAttempt::answered(Role::Validator(0), r#"{"verdict":"false","explanation":"b"}"#);

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert_eq!(outcome, ConsensusOutcome::Rejected(RejectionReason::Disagreement));
    }

    #[test]
    fn test_one_sided_missing_confidence_rejected() {
        let leader = answer(Role::Leader, "true", 0, "Yes");
        let validator =
            ExecutionAttempt::answered(Role::Validator(0), r#"{"verdict":"true","explanation":"Yes"}"#);

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn test_out_of_range_readings_compared_raw() {
        let leader = ExecutionAttempt::answered(
            Role::Leader,
            r#"{"verdict":"true","confidence":150,"explanation":"Yes"}"#,
        );
        let validator = answer(Role::Validator(0), "true", 100, "Yes");

        assert_eq!(leader.record.as_ref().map(|r| r.confidence), Some(100));
        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert!(!outcome.is_accepted());
    }

    #[test]
    fn test_leader_failure_rejected() {
        let leader = ExecutionAttempt::failed(Role::Leader, "connection reset");
        let validator = answer(Role::Validator(0), "true", 90, "Yes");

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert_eq!(outcome, ConsensusOutcome::Rejected(RejectionReason::LeaderFailed));
        assert!(outcome.record().is_none());
    }

    #[test]
    fn test_validator_failure_rejected() {
        let leader = answer(Role::Leader, "true", 90, "Yes");
        let validator = ExecutionAttempt::failed(Role::Validator(0), "timeout");

        let outcome = decide(&leader, &[validator], &ConsensusPolicy::default());
        assert_eq!(
            outcome,
            ConsensusOutcome::Rejected(RejectionReason::ValidatorsFailed)
        );
    }

    #[test]
    fn test_missing_validators_count_as_failed() {
        let leader = answer(Role::Leader, "true", 90, "Yes");
        let outcome = decide(&leader, &[], &ConsensusPolicy::default());
        assert_eq!(
            outcome,
            ConsensusOutcome::Rejected(RejectionReason::ValidatorsFailed)
        );
    }

    #[test]
    fn test_quorum_two_of_three() {
        let policy = ConsensusPolicy::new(3, 2).unwrap();
        let leader = answer(Role::Leader, "true", 85, "Yes");
        let validators = vec![
            answer(Role::Validator(0), "true", 80, "a"),
            answer(Role::Validator(1), "false", 80, "b"),
            answer(Role::Validator(2), "true", 95, "c"),
        ];

        let votes = tally(&leader, &validators, policy.confidence_tolerance);
        assert_eq!(
            votes,
            Tally {
                agreeing: 2,
                disagreeing: 1,
                failed: 0
            }
        );
        assert!(decide(&leader, &validators, &policy).is_accepted());

        let strict = ConsensusPolicy::unanimous(3).unwrap();
        assert_eq!(
            decide(&leader, &validators, &strict),
            ConsensusOutcome::Rejected(RejectionReason::Disagreement)
        );
    }

    #[test]
    fn test_policy_validation() {
        assert_eq!(ConsensusPolicy::new(0, 0), Err(PolicyError::NoValidators));
        assert_eq!(
            ConsensusPolicy::new(2, 3),
            Err(PolicyError::QuorumOutOfRange {
                quorum: 3,
                validators: 2
            })
        );
        assert!(ConsensusPolicy::new(2, 0).is_err());
        assert!(ConsensusPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_custom_tolerance() {
        let policy = ConsensusPolicy::default().with_tolerance(5);
        let leader = answer(Role::Leader, "true", 90, "Yes");
        let validator = answer(Role::Validator(0), "true", 80, "Yes");

        assert!(!decide(&leader, &[validator], &policy).is_accepted());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Leader.to_string(), "leader");
        assert_eq!(Role::Validator(2).to_string(), "validator[2]");
    }
}
