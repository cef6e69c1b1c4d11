use std::future::Future;
use std::pin::Pin;

use bevy::prelude::*;
use thiserror::Error;

use super::capture::{PreviewImage, ReferenceCapture};

/// Future returned by the asynchronous collaborator operations.
pub type TrackingFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    #[error("no reference object could be extracted: {0}")]
    ExtractionFailed(String),
    #[error("merging reference objects failed: {0}")]
    MergeFailed(String),
}

/// Identifier of an anchor the collaborator placed for a detected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// The environment tracking session the scanner is built on.
///
/// Implementations own the sensor fusion. Extraction and merge run outside the
/// control thread and resolve through the returned futures; the scanner polls them
/// from its own systems, so implementations never call back into scanner state.
pub trait TrackingSession: Send + Sync + 'static {
    /// Extract a reference object from the region `extent` around `transform`.
    /// The capture comes back expressed in that region's local frame.
    fn create_reference_object(
        &self,
        transform: Transform,
        extent: Vec3,
    ) -> TrackingFuture<Result<ReferenceCapture, TrackingError>>;

    /// Merge `other` into `base`.
    fn merge_reference_objects(
        &self,
        base: ReferenceCapture,
        other: ReferenceCapture,
    ) -> TrackingFuture<Result<ReferenceCapture, TrackingError>>;

    /// Restart the session so that it reports detections of `capture`.
    fn run_detection(&self, capture: &ReferenceCapture);

    /// Drop an anchor reported for a detection so the object can be detected again.
    fn remove_anchor(&self, anchor: AnchorId);

    /// Switch back to scanning after a test run.
    fn resume_scanning(&self);

    /// Grab the current camera image, `None` when no frame exists yet.
    fn capture_preview_image(&self) -> Option<PreviewImage>;
}
