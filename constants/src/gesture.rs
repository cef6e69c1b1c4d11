/// Screen-space distance (px) a two-finger pan must travel before it moves anything
pub const PAN_THRESHOLD_PX: f32 = 30.0;

/// Rotation (rad) a rotate gesture must accumulate before it is applied (12°)
pub const ROTATION_THRESHOLD_RAD: f32 = std::f32::consts::PI / 15.0;

/// Change in two-finger separation (px) before a pinch starts scaling
pub const PINCH_THRESHOLD_PX: f32 = 50.0;

/// Screen radius (px) around the projected origin in which a tap counts as hitting it
pub const ORIGIN_TAP_RADIUS_PX: f32 = 40.0;

/// Screen distance (px) a one-finger axis drag must cover before an axis is locked
pub const AXIS_LOCK_DISTANCE_PX: f32 = 4.0;
