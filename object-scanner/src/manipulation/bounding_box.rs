use bevy::prelude::*;

use super::ray::{closest_point_on_line_to_ray, ray_hits_horizontal_plane, ray_hits_obb};
use super::snapping::wrap_angle;
use super::tiles::{BoxFace, CoverageTracker};
use crate::settings::ScanSettings;
use crate::tracking::FrameCamera;

#[derive(Debug, Clone, Copy)]
struct FaceDrag {
    face: BoxFace,
    anchor: Vec3,
    world_normal: Vec3,
    start_extent: Vec3,
    start_position: Vec3,
    symmetric: bool,
}

#[derive(Debug, Clone, Copy)]
struct GroundDrag {
    start_hit: Vec3,
    start_position: Vec3,
    plane_height: f32,
}

/// The box enclosing the scanned object: world position, yaw about the vertical
/// axis and extent.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub position: Vec3,
    pub yaw: f32,
    pub extent: Vec3,
    coverage: CoverageTracker,
    face_drag: Option<FaceDrag>,
    ground_drag: Option<GroundDrag>,
    min_extent: f32,
    max_extent: f32,
}

impl BoundingBox {
    /// Unrotated box at `position`, with tiles for `extent`.
    pub fn new(position: Vec3, extent: Vec3, settings: &ScanSettings) -> Self {
        Self {
            position,
            yaw: 0.0,
            extent,
            coverage: CoverageTracker::new(extent, settings),
            face_drag: None,
            ground_drag: None,
            min_extent: settings.min_extent,
            max_extent: settings.max_extent,
        }
    }

    /// World pose: position plus yaw about the vertical axis.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(Quat::from_rotation_y(self.yaw))
    }

    /// World point in the box's frame.
    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        self.transform().compute_matrix().inverse().transform_point3(world)
    }

    /// Point in the box's frame to world space.
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.transform().transform_point(local)
    }

    /// Whether `world` lies inside or on the box.
    pub fn contains(&self, world: Vec3) -> bool {
        self.world_to_local(world).abs().cmple(self.extent * 0.5).all()
    }

    /// Height of the bottom face.
    pub fn bottom_y(&self) -> f32 {
        self.position.y - self.extent.y * 0.5
    }

    /// Product of the extents, in m³.
    pub fn volume(&self) -> f32 {
        self.extent.x * self.extent.y * self.extent.z
    }

    /// Every axis inside the supported range and enough total volume.
    pub fn is_reasonably_sized(&self, settings: &ScanSettings) -> bool {
        let range = settings.min_extent..=settings.max_extent;
        range.contains(&self.extent.x)
            && range.contains(&self.extent.y)
            && range.contains(&self.extent.z)
            && self.volume() >= settings.min_volume
    }

    fn clamp_axis(&self, value: f32) -> f32 {
        value.clamp(self.min_extent, self.max_extent)
    }

    /// Begin dragging the face under `ray`. A symmetric drag moves the opposite
    /// face as well, keeping the center fixed.
    pub fn start_face_drag(&mut self, ray: Ray3d, symmetric: bool) -> bool {
        let Some(hit) = ray_hits_obb(ray.origin, *ray.direction, self.transform(), self.extent) else {
            return false;
        };
        let face = BoxFace::from_normal(hit.local_normal);
        self.face_drag = Some(FaceDrag {
            face,
            anchor: ray.get_point(hit.t),
            world_normal: Quat::from_rotation_y(self.yaw) * face.normal(),
            start_extent: self.extent,
            start_position: self.position,
            symmetric,
        });
        true
    }

    /// Move the dragged face to follow `ray`, returns true when the box changed.
    pub fn update_face_drag(&mut self, ray: Ray3d) -> bool {
        let Some(drag) = self.face_drag else {
            return false;
        };
        let Some(point) = closest_point_on_line_to_ray(drag.anchor, drag.world_normal, ray) else {
            return false;
        };
        let offset = (point - drag.anchor).dot(drag.world_normal);
        let axis = drag.face.axis();
        let mut extent = drag.start_extent;
        let mut position = drag.start_position;
        if drag.symmetric {
            extent[axis] = self.clamp_axis(drag.start_extent[axis] + offset * 2.0);
        } else {
            extent[axis] = self.clamp_axis(drag.start_extent[axis] + offset);
            let applied = extent[axis] - drag.start_extent[axis];
            position += drag.world_normal * applied * 0.5;
        }
        let changed = extent != self.extent || position != self.position;
        self.extent = extent;
        self.position = position;
        changed
    }

    /// Release the face being dragged.
    pub fn end_face_drag(&mut self) {
        self.face_drag = None;
    }

    pub fn is_being_dragged(&self) -> bool {
        self.face_drag.is_some() || self.ground_drag.is_some()
    }

    /// Begin moving the box across the horizontal plane through its center.
    pub fn start_ground_plane_drag(&mut self, ray: Ray3d) -> bool {
        let plane_height = self.position.y;
        let Some(start_hit) = ray_hits_horizontal_plane(ray, plane_height) else {
            return false;
        };
        self.ground_drag = Some(GroundDrag {
            start_hit,
            start_position: self.position,
            plane_height,
        });
        true
    }

    pub fn update_ground_plane_drag(&mut self, ray: Ray3d) -> bool {
        let Some(drag) = self.ground_drag else {
            return false;
        };
        let Some(hit) = ray_hits_horizontal_plane(ray, drag.plane_height) else {
            return false;
        };
        let delta = hit - drag.start_hit;
        let position = drag.start_position + Vec3::new(delta.x, 0.0, delta.z);
        let changed = position != self.position;
        self.position = position;
        changed
    }

    pub fn end_ground_plane_drag(&mut self) {
        self.ground_drag = None;
    }

    /// Spin about the vertical axis, wrapping the yaw into (-π, π].
    pub fn rotate_on_y_axis(&mut self, angle: f32) {
        self.yaw = wrap_angle(self.yaw + angle);
    }

    /// Scale every axis by `factor` while keeping the bottom face in place.
    pub fn scale(&mut self, factor: f32) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let bottom = self.bottom_y();
        let extent = Vec3::new(
            self.clamp_axis(self.extent.x * factor),
            self.clamp_axis(self.extent.y * factor),
            self.clamp_axis(self.extent.z * factor),
        );
        if extent == self.extent {
            return false;
        }
        self.extent = extent;
        self.position.y = bottom + extent.y * 0.5;
        true
    }

    /// Move the box so its center sits above the point where `ray` meets the
    /// plane of its bottom face.
    pub fn move_to(&mut self, ray: Ray3d) -> bool {
        let Some(hit) = ray_hits_horizontal_plane(ray, self.bottom_y()) else {
            return false;
        };
        self.position.x = hit.x;
        self.position.z = hit.z;
        true
    }

    /// Fit the box around the feature points close to where the camera looks.
    ///
    /// Refits are blended into the current pose with `ghost_fit_smoothing` so the
    /// provisional box does not flicker from frame to frame.
    pub fn fit_over_point_cloud(&mut self, points: &[Vec3], camera: &FrameCamera, settings: &ScanSettings) -> bool {
        let Some(target) = fit_bounds(points, camera, settings) else {
            return false;
        };
        let (center, extent) = target;
        let factor = settings.ghost_fit_smoothing.clamp(0.0, 1.0);
        self.position = self.position.lerp(center, factor);
        self.extent = self.extent.lerp(extent, factor);
        true
    }

    pub fn coverage(&self) -> &CoverageTracker {
        &self.coverage
    }

    /// Highlight the tile in view and record capture progress. Tiles are rebuilt
    /// first when the extent changed since the last update.
    pub fn update_coverage(&mut self, camera: &FrameCamera) -> Option<u32> {
        let transform = self.transform();
        if self.coverage.extent() != self.extent {
            self.coverage.rebuild(self.extent);
        }
        self.coverage.highlight_current_tile(transform, camera);
        self.coverage.update_capturing_progress(transform, camera)
    }

    /// Capture progress of the last coverage update.
    pub fn progress_percentage(&self) -> u32 {
        self.coverage.progress_percentage()
    }

    #[cfg(test)]
    pub(crate) fn coverage_mut(&mut self) -> &mut CoverageTracker {
        &mut self.coverage
    }
}

/// Center and extent of the feature points near the camera's focus point.
pub fn fit_bounds(points: &[Vec3], camera: &FrameCamera, settings: &ScanSettings) -> Option<(Vec3, Vec3)> {
    let ray = camera.center_ray()?;
    let direction = *ray.direction;
    let focus = points
        .iter()
        .filter(|p| (**p - ray.origin).dot(direction) > 0.0)
        .min_by(|a, b| {
            distance_to_ray(**a, ray.origin, direction).total_cmp(&distance_to_ray(**b, ray.origin, direction))
        })?;

    let radius_sq = settings.ghost_fit_radius * settings.ghost_fit_radius;
    let nearby: Vec<Vec3> = points
        .iter()
        .copied()
        .filter(|p| {
            let dx = p.x - focus.x;
            let dz = p.z - focus.z;
            dx * dx + dz * dz <= radius_sq && (p.y - focus.y).abs() <= settings.ghost_fit_radius
        })
        .collect();
    if nearby.len() < settings.ghost_fit_min_points {
        return None;
    }

    let (min, max) = nearby.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    let extent = (max - min).clamp(Vec3::splat(settings.min_extent), Vec3::splat(settings.max_extent));
    Some(((min + max) * 0.5, extent))
}

fn distance_to_ray(point: Vec3, origin: Vec3, direction: Vec3) -> f32 {
    let to_point = point - origin;
    (to_point - direction * to_point.dot(direction)).length()
}
