//! Semantic agreement between two oracle executions.
//!
//! Two records agree when their verdicts fall into the same bucket and their
//! confidences are within a tolerance band. Explanations are never compared:
//! the oracle rewords them on every call.

use crate::types::Verdict;

/// Maximum confidence distance between agreeing records.
pub const DEFAULT_CONFIDENCE_TOLERANCE: u8 = 20;

/// Whether two verdict labels are interchangeable.
///
/// True for identical labels and for the `false`/`partial` pair.
pub fn verdicts_equivalent(a: Verdict, b: Verdict) -> bool {
    a.bucket() == b.bucket()
}

/// Whether two confidence readings are within `tolerance` of each other.
///
/// A missing or non-numeric reading is never close to anything.
pub fn confidence_close(x: Option<i64>, y: Option<i64>, tolerance: u8) -> bool {
    match (x, y) {
        (Some(x), Some(y)) => x.abs_diff(y) <= u64::from(tolerance),
        _ => false,
    }
}
