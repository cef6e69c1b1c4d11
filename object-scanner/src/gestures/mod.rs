//! Touch gesture input and jitter filtering.
//!
//! Continuous gestures (two-finger pan, pinch, rotate) pass through a threshold
//! filter before they reach a manipulator. Until the gesture has moved past its
//! dead zone the filter reports identity, afterwards it reports the motion beyond
//! the dead zone boundary and then every later delta unchanged. Filters reset when
//! the gesture ends or is cancelled.

/// Gesture events and phases.
pub mod input;

/// Threshold filters for pan, pinch and rotation.
pub mod threshold;

pub use input::{GestureInput, GesturePhase};
pub use threshold::{ThresholdPan, ThresholdPinch, ThresholdRotation};
