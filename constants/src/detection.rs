/// Seconds without a detection before the "unable to detect" advisory
pub const NO_DETECTION_TIMEOUT_SECS: f32 = 5.0;

/// Added to the mean detection delay to get the marker display duration
pub const DISPLAY_DURATION_MARGIN_SECS: f64 = 0.2;

/// Lifetime of tracking state messages (not available / limited)
pub const TRACKING_MESSAGE_SECS: f32 = 3.0;

/// Seconds an advisory stays in the session info area
pub const ADVISORY_MESSAGE_SECS: f32 = 5.0;
