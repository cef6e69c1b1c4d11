use bevy::prelude::*;
use constants::{detection, gesture, scan, snapping};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to parse scanner settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid scanner settings: {0}")]
    Invalid(String),
}

/// Tuning values for the scanner, defaulting to the `constants` crate.
///
/// Every section is optional when loading from JSON, so a settings file only
/// needs to list the values it overrides.
#[derive(Resource, Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    pub gestures: GestureSettings,
    pub snapping: SnapSettings,
    pub scan: ScanSettings,
    pub detection: DetectionSettings,
}

impl ScannerSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.scan.min_extent <= 0.0 || self.scan.min_extent >= self.scan.max_extent {
            return Err(SettingsError::Invalid(format!(
                "extent range {}..{} is empty",
                self.scan.min_extent, self.scan.max_extent
            )));
        }
        if self.snapping.rotation_interval <= 0.0 {
            return Err(SettingsError::Invalid(
                "rotation snap interval must be positive".to_string(),
            ));
        }
        if self.scan.max_tile_size <= 0.0 {
            return Err(SettingsError::Invalid(
                "tile size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    pub pan_threshold: f32,
    pub rotation_threshold: f32,
    pub pinch_threshold: f32,
    pub origin_tap_radius: f32,
    pub axis_lock_distance: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            pan_threshold: gesture::PAN_THRESHOLD_PX,
            rotation_threshold: gesture::ROTATION_THRESHOLD_RAD,
            pinch_threshold: gesture::PINCH_THRESHOLD_PX,
            origin_tap_radius: gesture::ORIGIN_TAP_RADIUS_PX,
            axis_lock_distance: gesture::AXIS_LOCK_DISTANCE_PX,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    pub plane_threshold: f32,
    pub side_threshold: f32,
    pub center_threshold: f32,
    pub rotation_interval: f32,
    pub rotation_threshold: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            plane_threshold: snapping::PLANE_SNAP_THRESHOLD,
            side_threshold: snapping::SIDE_SNAP_THRESHOLD,
            center_threshold: snapping::CENTER_SNAP_THRESHOLD,
            rotation_interval: snapping::ROTATION_SNAP_INTERVAL,
            rotation_threshold: snapping::ROTATION_SNAP_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub min_extent: f32,
    pub max_extent: f32,
    pub min_volume: f32,
    pub min_feature_count: usize,
    pub object_creation_interval: f64,
    pub low_light_intensity: f32,
    pub max_tile_size: f32,
    pub coverage_ray_frame_interval: u32,
    pub coverage_ray_length: f32,
    pub tile_captured_opacity: f32,
    pub tile_highlight_opacity: f32,
    pub ghost_fit_radius: f32,
    pub ghost_fit_min_points: usize,
    pub ghost_fit_smoothing: f32,
    pub ghost_default_extent: f32,
    pub point_margin: f32,
    pub origin_scale_range: (f32, f32),
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            min_extent: scan::MIN_EXTENT,
            max_extent: scan::MAX_EXTENT,
            min_volume: scan::MIN_VOLUME,
            min_feature_count: scan::MIN_FEATURE_COUNT,
            object_creation_interval: scan::OBJECT_CREATION_INTERVAL_SECS,
            low_light_intensity: scan::LOW_LIGHT_INTENSITY,
            max_tile_size: scan::MAX_TILE_SIZE,
            coverage_ray_frame_interval: scan::COVERAGE_RAY_FRAME_INTERVAL,
            coverage_ray_length: scan::COVERAGE_RAY_LENGTH,
            tile_captured_opacity: scan::TILE_CAPTURED_OPACITY,
            tile_highlight_opacity: scan::TILE_HIGHLIGHT_OPACITY,
            ghost_fit_radius: scan::GHOST_FIT_RADIUS,
            ghost_fit_min_points: scan::GHOST_FIT_MIN_POINTS,
            ghost_fit_smoothing: scan::GHOST_FIT_SMOOTHING,
            ghost_default_extent: scan::GHOST_DEFAULT_EXTENT,
            point_margin: scan::POINT_VISUALISATION_MARGIN,
            origin_scale_range: scan::ORIGIN_SCALE_RANGE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub no_detection_timeout: f32,
    pub display_duration_margin: f64,
    pub tracking_message_duration: f32,
    pub advisory_message_duration: f32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            no_detection_timeout: detection::NO_DETECTION_TIMEOUT_SECS,
            display_duration_margin: detection::DISPLAY_DURATION_MARGIN_SECS,
            tracking_message_duration: detection::TRACKING_MESSAGE_SECS,
            advisory_message_duration: detection::ADVISORY_MESSAGE_SECS,
        }
    }
}
