//! The scanning workflow.
//!
//! A scan moves through `ready`, `defineBoundingBox`, `scanning` and
//! `adjustingOrigin`, one step at a time. [`ScanSession`] owns everything a scan
//! produces and routes per-frame tracking data and touch gestures to it according
//! to the current stage.

/// Per-frame ghost fitting, incremental builds and coverage.
mod frame_update;

/// Confirmation prompts holding back a transition.
pub mod prompts;

/// Gesture dispatch to the volume or origin.
mod routing;

pub mod session;

/// Workflow stages.
pub mod state;

pub use prompts::{PendingTransition, PromptChoice, PromptResolution, ScanPrompt};
pub use session::ScanSession;
pub use state::ScanState;
