use thiserror::Error;

use crate::scan::ScanState;
use crate::tracking::TrackingError;

/// Precondition failures of the scan workflow. None of them change session state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("no ghost bounding box has been created yet")]
    GhostBoxMissing,
    #[error("no bounding box has been confirmed yet")]
    BoundingBoxMissing,
    #[error("cannot go from {from} to {to}")]
    IllegalTransition { from: ScanState, to: ScanState },
    #[error("waiting for a decision on a pending prompt")]
    PromptPending,
    #[error("no prompt is waiting for a decision")]
    NoPromptPending,
    #[error("no bounding box or object origin present")]
    MissingVolumeOrOrigin,
    #[error("a reference object is already being finalized")]
    FinalizeInProgress,
    #[error("a failed merge is waiting for a choice between the two scans")]
    MergeConflictPending,
    #[error("no merge conflict is waiting for a decision")]
    NoMergeConflict,
    #[error("no reference object is available to test")]
    NoReferenceObject,
    #[error(transparent)]
    Tracking(#[from] TrackingError),
}
