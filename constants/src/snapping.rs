/// Distance (m) under which the volume bottom snaps onto a horizontal plane
pub const PLANE_SNAP_THRESHOLD: f32 = 0.01;

/// Distance (m) under which the origin snaps onto a side of the volume
pub const SIDE_SNAP_THRESHOLD: f32 = 0.01;

/// Horizontal distance (m) under which the origin snaps to the volume center
pub const CENTER_SNAP_THRESHOLD: f32 = 0.01;

/// Rotation snapping interval for the origin (90°)
pub const ROTATION_SNAP_INTERVAL: f32 = std::f32::consts::FRAC_PI_2;

/// Angle (rad) for entering and breaking a rotation snap (~6°)
pub const ROTATION_SNAP_THRESHOLD: f32 = 0.1;
