//! Boundary to the environment tracking collaborator.
//!
//! The scanner does not track the world itself. Each frame it receives a
//! [`TrackingFrame`] (camera pose, raw feature points, plane anchors, light
//! estimate), and it asks a [`TrackingSession`] to extract, merge and detect
//! reference objects. Those requests are asynchronous and return futures that the
//! scanner polls on its control thread.

/// Reference objects and preview images exchanged with the collaborator.
pub mod capture;

/// Per-frame data, plane anchors and the pinhole camera used for projection.
pub mod frame;

/// Collaborator trait and its error type.
pub mod session;

pub use capture::{PreviewImage, ReferenceCapture};
pub use frame::{FrameCamera, LimitedReason, PlaneAnchor, TrackingFrame, TrackingState};
pub use session::{AnchorId, TrackingError, TrackingFuture, TrackingSession};
