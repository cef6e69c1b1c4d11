/// Smallest supported extent (m) along any axis of the scanned volume
pub const MIN_EXTENT: f32 = 0.01;

/// Largest supported extent (m) along any axis of the scanned volume
pub const MAX_EXTENT: f32 = 5.0;

/// Minimum product of extents (m³) for a volume to count as reasonably sized
pub const MIN_VOLUME: f32 = 0.0005;

/// Feature points required before a scan is considered detailed enough
pub const MIN_FEATURE_COUNT: usize = 100;

/// Seconds between incremental reference object builds while scanning
pub const OBJECT_CREATION_INTERVAL_SECS: f64 = 1.0;

/// Ambient light intensity (lumen) below which the low light advisory is shown
pub const LOW_LIGHT_INTENSITY: f32 = 500.0;

/// Maximum edge length (m) of a single capture progress tile
pub const MAX_TILE_SIZE: f32 = 0.1;

/// A new camera coverage ray is recorded every this many frames
pub const COVERAGE_RAY_FRAME_INTERVAL: u32 = 20;

/// Length (m) of camera rays used for tile hit testing
pub const COVERAGE_RAY_LENGTH: f32 = 5.0;

/// Opacity contributed by a tile that has been captured
pub const TILE_CAPTURED_OPACITY: f32 = 0.5;

/// Opacity contributed by the tile currently under the view center
pub const TILE_HIGHLIGHT_OPACITY: f32 = 0.35;

/// Radius (m) around the focus point used when fitting the ghost volume
pub const GHOST_FIT_RADIUS: f32 = 0.3;

/// Minimum feature points needed to refit the ghost volume
pub const GHOST_FIT_MIN_POINTS: usize = 10;

/// Lerp factor applied to ghost volume refits, lower is smoother
pub const GHOST_FIT_SMOOTHING: f32 = 0.15;

/// Extent (m) of the ghost before any points have been fitted
pub const GHOST_DEFAULT_EXTENT: f32 = 0.2;

/// Margin (m) around the volume in which points are still visualised
pub const POINT_VISUALISATION_MARGIN: f32 = 0.02;

/// Smallest and largest display scale of the origin gizmo
pub const ORIGIN_SCALE_RANGE: (f32, f32) = (0.25, 4.0);
