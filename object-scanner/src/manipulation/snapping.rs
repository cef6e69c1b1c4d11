use bevy::prelude::*;

use crate::settings::SnapSettings;
use crate::tracking::PlaneAnchor;

/// Edge-triggered snap flag.
///
/// The flag is raised the first time a value comes within range and is only
/// lowered once the value is measured outside the threshold again, so a value
/// hovering on the boundary cannot produce repeated feedback pulses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapLatch {
    snapped: bool,
}

impl SnapLatch {
    /// Returns true exactly when the latch goes from unsnapped to snapped.
    pub fn update(&mut self, within_threshold: bool) -> bool {
        let rising = within_threshold && !self.snapped;
        self.snapped = within_threshold;
        rising
    }

    pub fn is_snapped(&self) -> bool {
        self.snapped
    }

    pub fn reset(&mut self) {
        self.snapped = false;
    }
}

/// Value after snapping, plus whether a feedback pulse should fire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapped<T> {
    pub value: T,
    pub pulse: bool,
}

/// Holds the four independent snap behaviours and their hysteresis state.
#[derive(Debug, Clone)]
pub struct SnapEngine {
    settings: SnapSettings,
    plane: SnapLatch,
    side: SnapLatch,
    center: SnapLatch,
    rotation_snapped: bool,
    rotation_since_snap: f32,
}

impl SnapEngine {
    pub fn new(settings: SnapSettings) -> Self {
        Self {
            settings,
            plane: SnapLatch::default(),
            side: SnapLatch::default(),
            center: SnapLatch::default(),
            rotation_snapped: false,
            rotation_since_snap: 0.0,
        }
    }

    /// Clamp a volume's vertical center so its bottom rests on a nearby plane.
    pub fn snap_to_horizontal_plane(
        &mut self,
        center_y: f32,
        extent_y: f32,
        planes: &[PlaneAnchor],
    ) -> Snapped<f32> {
        let bottom_y = center_y - extent_y * 0.5;
        let nearest = planes
            .iter()
            .map(|plane| plane.height())
            .filter(|height| (bottom_y - height).abs() < self.settings.plane_threshold)
            .min_by(|a, b| (bottom_y - a).abs().total_cmp(&(bottom_y - b).abs()));

        let value = match nearest {
            Some(height) => height + extent_y * 0.5,
            None => center_y,
        };
        Snapped {
            value,
            pulse: self.plane.update(nearest.is_some()),
        }
    }

    /// Clamp each axis of a volume-local position onto the nearest side it is close to.
    pub fn snap_to_sides(&mut self, position: Vec3, extent: Vec3) -> Snapped<Vec3> {
        let threshold = self.settings.side_threshold;
        let mut snapped = position;
        let mut within = false;
        for axis in 0..3 {
            let half = extent[axis] * 0.5;
            if (half - position[axis]).abs() < threshold {
                snapped[axis] = half;
                within = true;
            } else if (-half - position[axis]).abs() < threshold {
                snapped[axis] = -half;
                within = true;
            }
        }
        Snapped {
            value: snapped,
            pulse: self.side.update(within),
        }
    }

    /// Clamp the horizontal axes onto `center`, leaving height untouched.
    pub fn snap_to_center(&mut self, position: Vec3, center: Vec3) -> Snapped<Vec3> {
        let threshold = self.settings.center_threshold;
        let within = (center.x - position.x).abs() < threshold
            && (center.z - position.z).abs() < threshold;
        let value = if within {
            Vec3::new(center.x, position.y, center.z)
        } else {
            position
        };
        Snapped {
            value,
            pulse: self.center.update(within),
        }
    }

    /// Rotate `yaw` by `delta`, sticking to multiples of the snap interval.
    ///
    /// While snapped, incoming rotation accumulates and is only applied once it
    /// exceeds the threshold. While free, the rotated yaw is clamped onto the
    /// nearest multiple when it lands within the threshold.
    pub fn rotate_with_snapping(&mut self, yaw: f32, delta: f32) -> Snapped<f32> {
        let threshold = self.settings.rotation_threshold;
        if self.rotation_snapped {
            self.rotation_since_snap += delta;
            if self.rotation_since_snap.abs() > threshold {
                let value = wrap_angle(yaw + self.rotation_since_snap);
                self.rotation_snapped = false;
                self.rotation_since_snap = 0.0;
                return Snapped { value, pulse: false };
            }
            return Snapped { value: yaw, pulse: false };
        }

        let rotated = wrap_angle(yaw + delta);
        let interval = self.settings.rotation_interval;
        let snap_angle = (rotated / interval).round() * interval;
        if (snap_angle - rotated).abs() < threshold {
            self.rotation_snapped = true;
            self.rotation_since_snap = 0.0;
            Snapped {
                value: snap_angle,
                pulse: true,
            }
        } else {
            Snapped {
                value: rotated,
                pulse: false,
            }
        }
    }

    pub fn is_snapped_to_plane(&self) -> bool {
        self.plane.is_snapped()
    }

    pub fn is_snapped_to_center(&self) -> bool {
        self.center.is_snapped()
    }

    pub fn is_snapped_to_rotation(&self) -> bool {
        self.rotation_snapped
    }
}

/// Wrap an angle into (-π, π].
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn engine() -> SnapEngine {
        SnapEngine::new(SnapSettings::default())
    }

    fn plane(height: f32) -> PlaneAnchor {
        PlaneAnchor {
            center: Vec3::new(0.0, height, 0.0),
        }
    }

    #[test]
    fn volume_bottom_snaps_onto_nearby_plane() {
        let mut snap = engine();
        let result = snap.snap_to_horizontal_plane(0.205, 0.4, &[plane(0.0)]);
        assert_abs_diff_eq!(result.value, 0.2, epsilon = 1e-6);
        assert!(result.pulse);
        assert!(snap.is_snapped_to_plane());
    }

    #[test]
    fn plane_snap_pulses_only_on_entry() {
        let mut snap = engine();
        assert!(snap.snap_to_horizontal_plane(0.205, 0.4, &[plane(0.0)]).pulse);
        assert!(!snap.snap_to_horizontal_plane(0.203, 0.4, &[plane(0.0)]).pulse);
        let away = snap.snap_to_horizontal_plane(0.3, 0.4, &[plane(0.0)]);
        assert!(!away.pulse);
        assert_abs_diff_eq!(away.value, 0.3);
        assert!(!snap.is_snapped_to_plane());
        assert!(snap.snap_to_horizontal_plane(0.205, 0.4, &[plane(0.0)]).pulse);
    }

    #[test]
    fn snapped_plane_survives_small_perturbation() {
        let mut snap = engine();
        snap.snap_to_horizontal_plane(0.2, 0.4, &[plane(0.0)]);
        snap.snap_to_horizontal_plane(0.2 + 0.009, 0.4, &[plane(0.0)]);
        assert!(snap.is_snapped_to_plane());
        snap.snap_to_horizontal_plane(0.2 + 0.011, 0.4, &[plane(0.0)]);
        assert!(!snap.is_snapped_to_plane());
    }

    #[test]
    fn nearest_of_several_planes_wins() {
        let mut snap = engine();
        let result = snap.snap_to_horizontal_plane(0.5, 0.2, &[plane(0.405), plane(0.398)]);
        assert_abs_diff_eq!(result.value, 0.498, epsilon = 1e-6);
    }

    #[test]
    fn side_snap_clamps_each_axis_independently() {
        let mut snap = engine();
        let extent = Vec3::new(0.4, 0.2, 0.6);
        let result = snap.snap_to_sides(Vec3::new(0.195, 0.0, -0.295), extent);
        assert_abs_diff_eq!(result.value.x, 0.2);
        assert_abs_diff_eq!(result.value.y, 0.0);
        assert_abs_diff_eq!(result.value.z, -0.3);
        assert!(result.pulse);
    }

    #[test]
    fn side_snap_ignores_positions_far_from_sides() {
        let mut snap = engine();
        let result = snap.snap_to_sides(Vec3::new(0.05, 0.0, 0.0), Vec3::splat(0.4));
        assert_eq!(result.value, Vec3::new(0.05, 0.0, 0.0));
        assert!(!result.pulse);
    }

    #[test]
    fn center_snap_leaves_height_alone() {
        let mut snap = engine();
        let result = snap.snap_to_center(Vec3::new(0.004, -0.1, -0.006), Vec3::ZERO);
        assert_eq!(result.value, Vec3::new(0.0, -0.1, 0.0));
        assert!(result.pulse);
        let again = snap.snap_to_center(Vec3::new(0.002, -0.1, 0.0), Vec3::ZERO);
        assert!(!again.pulse);
        assert!(snap.is_snapped_to_center());
    }

    #[test]
    fn center_snap_needs_both_axes_close() {
        let mut snap = engine();
        let result = snap.snap_to_center(Vec3::new(0.004, 0.0, 0.05), Vec3::ZERO);
        assert!(!result.pulse);
        assert_eq!(result.value, Vec3::new(0.004, 0.0, 0.05));
    }

    #[test]
    fn rotation_far_from_multiple_stays_free() {
        let mut snap = engine();
        let result = snap.rotate_with_snapping(40f32.to_radians(), 4f32.to_radians());
        assert_abs_diff_eq!(result.value, 44f32.to_radians(), epsilon = 1e-5);
        assert!(!result.pulse);
        assert!(!snap.is_snapped_to_rotation());
    }

    #[test]
    fn rotation_near_multiple_clamps_and_snaps() {
        let mut snap = engine();
        let result = snap.rotate_with_snapping(80f32.to_radians(), 7f32.to_radians());
        assert_abs_diff_eq!(result.value, std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
        assert!(result.pulse);
        assert!(snap.is_snapped_to_rotation());
    }

    #[test]
    fn snapped_rotation_holds_until_accumulated_delta_exceeds_threshold() {
        let mut snap = engine();
        let yaw = snap
            .rotate_with_snapping(80f32.to_radians(), 7f32.to_radians())
            .value;
        let held = snap.rotate_with_snapping(yaw, 0.04);
        assert_eq!(held.value, yaw);
        let held = snap.rotate_with_snapping(held.value, 0.04);
        assert_eq!(held.value, yaw);
        assert!(snap.is_snapped_to_rotation());
        let broken = snap.rotate_with_snapping(held.value, 0.04);
        assert_abs_diff_eq!(broken.value, yaw + 0.12, epsilon = 1e-5);
        assert!(!broken.pulse);
        assert!(!snap.is_snapped_to_rotation());
    }

    #[test]
    fn wrap_angle_stays_in_half_open_range() {
        use std::f32::consts::PI;
        assert_abs_diff_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(wrap_angle(-PI), PI, epsilon = 1e-5);
        assert_abs_diff_eq!(wrap_angle(0.3), 0.3, epsilon = 1e-6);
    }
}
