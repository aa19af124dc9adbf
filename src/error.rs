use thiserror::Error;

/// Errors that the fusion core can surface from a public call.
///
/// `DegenerateScan` from the spec is deliberately not a variant here: zero
/// pixels surviving scan preprocessing is not an error, it is represented as
/// an [`crate::fusion::IngestSummary`] with every counter at zero.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FusionError {
    /// A keyframe was submitted before intrinsics were set.
    #[error("keyframe ingested before intrinsics were set")]
    NotReady,

    /// The surfel store ran out of free slots while integrating a keyframe.
    /// The keyframe was partially integrated: `integrated` pixels were
    /// inserted or updated before the store was exhausted. There is no
    /// rollback.
    #[error("surfel store exhausted after integrating {integrated} pixel(s)")]
    OutOfCapacity { integrated: usize },

    /// A non-unit quaternion or non-positive intrinsics were supplied.
    /// Refused without mutating any state.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}
