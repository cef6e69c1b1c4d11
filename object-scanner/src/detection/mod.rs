//! Test runs of a finished reference object and the session info line.

/// Status messages for tracking quality and advisories.
pub mod session_info;

/// Detection statistics, marker and no-detection watchdog.
pub mod test_run;

pub use session_info::SessionInfo;
pub use test_run::{DetectionMarker, DetectionStats, TestRunTracker};
