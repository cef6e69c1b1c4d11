use bevy::prelude::*;

/// Quality of the tracking collaborator's world tracking for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    #[default]
    Normal,
    Limited(LimitedReason),
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedReason {
    Initializing,
    ExcessiveMotion,
    InsufficientFeatures,
    Relocalizing,
}

impl TrackingState {
    pub fn presentation_string(&self) -> &'static str {
        match self {
            Self::Normal => "Tracking normal",
            Self::NotAvailable => "Tracking unavailable",
            Self::Limited(LimitedReason::Initializing) => "Initializing",
            Self::Limited(LimitedReason::ExcessiveMotion) => "Too much motion",
            Self::Limited(LimitedReason::InsufficientFeatures) => "Not enough surface detail",
            Self::Limited(LimitedReason::Relocalizing) => "Recovering from interruption",
        }
    }
}

/// Detected horizontal plane, only its height is used for snapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneAnchor {
    pub center: Vec3,
}

impl PlaneAnchor {
    pub fn height(&self) -> f32 {
        self.center.y
    }
}

/// Pinhole view of the device camera for a single frame.
///
/// Screen coordinates have their origin in the top left corner with y pointing
/// down; the camera looks along its local -Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCamera {
    pub transform: Transform,
    pub viewport_size: Vec2,
    pub vertical_fov: f32,
}

impl Default for FrameCamera {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            viewport_size: Vec2::new(1170.0, 2532.0),
            vertical_fov: 60f32.to_radians(),
        }
    }
}

impl FrameCamera {
    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn forward(&self) -> Vec3 {
        self.transform.rotation * Vec3::NEG_Z
    }

    fn focal_scale(&self) -> Vec2 {
        let tan_half = (self.vertical_fov * 0.5).tan();
        let aspect = self.viewport_size.x / self.viewport_size.y;
        Vec2::new(tan_half * aspect, tan_half)
    }

    /// Project a world point to screen space, `None` when it is behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let local = self.transform.rotation.inverse() * (world - self.transform.translation);
        if local.z >= -f32::EPSILON {
            return None;
        }
        let scale = self.focal_scale();
        let ndc = Vec2::new(local.x / -local.z / scale.x, local.y / -local.z / scale.y);
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport_size.x,
            (1.0 - ndc.y) * 0.5 * self.viewport_size.y,
        ))
    }

    /// World space ray through a screen position.
    pub fn viewport_to_world(&self, screen: Vec2) -> Option<Ray3d> {
        let scale = self.focal_scale();
        let ndc = Vec2::new(
            screen.x / self.viewport_size.x * 2.0 - 1.0,
            1.0 - screen.y / self.viewport_size.y * 2.0,
        );
        let local_dir = Vec3::new(ndc.x * scale.x, ndc.y * scale.y, -1.0);
        let direction = Dir3::new(self.transform.rotation * local_dir).ok()?;
        Some(Ray3d {
            origin: self.transform.translation,
            direction,
        })
    }

    /// Ray through the middle of the viewport.
    pub fn center_ray(&self) -> Option<Ray3d> {
        self.viewport_to_world(self.viewport_size * 0.5)
    }
}

/// Everything the tracking collaborator reports for one camera frame.
#[derive(Debug, Clone, Default)]
pub struct TrackingFrame {
    /// Sensor timestamp in seconds.
    pub timestamp: f64,
    pub camera: FrameCamera,
    pub tracking_state: TrackingState,
    pub raw_feature_points: Option<Vec<Vec3>>,
    pub plane_anchors: Vec<PlaneAnchor>,
    pub ambient_intensity: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera_at_origin() -> FrameCamera {
        FrameCamera {
            transform: Transform::IDENTITY,
            viewport_size: Vec2::new(1000.0, 1000.0),
            vertical_fov: 90f32.to_radians(),
        }
    }

    #[test]
    fn point_straight_ahead_projects_to_screen_center() {
        let camera = camera_at_origin();
        let screen = camera.project(Vec3::new(0.0, 0.0, -2.0)).unwrap();
        assert_abs_diff_eq!(screen.x, 500.0, epsilon = 1e-3);
        assert_abs_diff_eq!(screen.y, 500.0, epsilon = 1e-3);
    }

    #[test]
    fn point_behind_camera_does_not_project() {
        assert!(camera_at_origin().project(Vec3::new(0.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn unprojected_ray_passes_through_projected_point() {
        let camera = FrameCamera {
            transform: Transform::from_xyz(0.3, 1.2, 0.5)
                .looking_at(Vec3::new(0.0, 0.0, -1.0), Vec3::Y),
            ..camera_at_origin()
        };
        let target = Vec3::new(0.1, 0.05, -0.8);
        let screen = camera.project(target).unwrap();
        let ray = camera.viewport_to_world(screen).unwrap();
        let to_target = (target - ray.origin).normalize();
        assert_abs_diff_eq!(to_target.dot(*ray.direction), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn upper_half_of_screen_is_above_camera() {
        let camera = camera_at_origin();
        let screen = camera.project(Vec3::new(0.0, 0.5, -1.0)).unwrap();
        assert!(screen.y < 500.0);
    }
}
