use bevy::prelude::*;

use super::bounding_box::BoundingBox;
use super::ray::{closest_point_on_line_to_ray, ray_hits_horizontal_plane};
use super::snapping::SnapEngine;
use crate::tracking::FrameCamera;

#[derive(Debug, Clone, Copy)]
struct AxisDrag {
    start_screen: Vec2,
    start_world: Vec3,
    /// Chosen once the finger moved far enough to tell which axis it follows.
    axis: Option<LockedAxis>,
}

#[derive(Debug, Clone, Copy)]
struct LockedAxis {
    direction: Vec3,
    anchor: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct PlaneDrag {
    start_hit: Vec3,
    start_world: Vec3,
}

/// Result of a tap aimed at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginTap {
    /// The tap landed on the origin gizmo.
    Flashed,
    /// The origin moved onto the tapped spot of the volume's bottom face.
    Repositioned,
    Missed,
}

/// Outcome of a manipulation step: whether the pose changed and whether a snap
/// engaged during it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManipulationUpdate {
    pub changed: bool,
    pub pulse: bool,
}

/// Local coordinate frame of the scanned object, kept relative to the volume it
/// belongs to and always inside it.
#[derive(Debug, Clone)]
pub struct ObjectOrigin {
    /// Position in the owning volume's local frame.
    pub position: Vec3,
    /// Rotation about the vertical axis relative to the volume.
    pub yaw: f32,
    pub display_scale: f32,
    scale_range: (f32, f32),
    axis_drag: Option<AxisDrag>,
    plane_drag: Option<PlaneDrag>,
}

impl ObjectOrigin {
    /// Origin at the center of the bottom face of `volume`.
    pub fn at_bottom_center(volume: &BoundingBox, scale_range: (f32, f32)) -> Self {
        Self {
            position: Vec3::new(0.0, -volume.extent.y * 0.5, 0.0),
            yaw: 0.0,
            display_scale: 1.0,
            scale_range,
            axis_drag: None,
            plane_drag: None,
        }
    }

    pub fn local_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(Quat::from_rotation_y(self.yaw))
    }

    pub fn world_transform(&self, volume: &BoundingBox) -> Transform {
        volume.transform() * self.local_transform()
    }

    pub fn world_position(&self, volume: &BoundingBox) -> Vec3 {
        volume.local_to_world(self.position)
    }

    /// Clamp into the volume and apply side and center snapping.
    fn constrain(&mut self, local: Vec3, volume: &BoundingBox, snap: &mut SnapEngine) -> ManipulationUpdate {
        let half = volume.extent * 0.5;
        let clamped = local.clamp(-half, half);
        let side = snap.snap_to_sides(clamped, volume.extent);
        let center = snap.snap_to_center(side.value, Vec3::ZERO);
        let changed = center.value != self.position;
        self.position = center.value;
        ManipulationUpdate {
            changed,
            pulse: side.pulse || center.pulse,
        }
    }

    /// Keep the origin inside `volume` after the volume changed shape.
    pub fn clamp_into(&mut self, volume: &BoundingBox) {
        let half = volume.extent * 0.5;
        self.position = self.position.clamp(-half, half);
    }

    pub fn start_axis_drag(&mut self, screen: Vec2, volume: &BoundingBox) {
        self.axis_drag = Some(AxisDrag {
            start_screen: screen,
            start_world: self.world_position(volume),
            axis: None,
        });
    }

    /// Drag along the origin axis best aligned with the finger's motion. The axis
    /// locks once the finger has moved `lock_distance` pixels.
    pub fn update_axis_drag(
        &mut self,
        screen: Vec2,
        camera: &FrameCamera,
        volume: &BoundingBox,
        snap: &mut SnapEngine,
        lock_distance: f32,
    ) -> ManipulationUpdate {
        let Some(mut drag) = self.axis_drag else {
            return ManipulationUpdate::default();
        };
        if drag.axis.is_none() {
            let moved = screen - drag.start_screen;
            if moved.length() < lock_distance {
                return ManipulationUpdate::default();
            }
            let Some(direction) = self.best_screen_axis(moved, drag.start_world, camera, volume) else {
                return ManipulationUpdate::default();
            };
            let anchor = camera
                .viewport_to_world(drag.start_screen)
                .and_then(|ray| closest_point_on_line_to_ray(drag.start_world, direction, ray))
                .unwrap_or(drag.start_world);
            drag.axis = Some(LockedAxis { direction, anchor });
            self.axis_drag = Some(drag);
        }
        let Some(axis) = drag.axis else {
            return ManipulationUpdate::default();
        };
        let Some(point) = camera
            .viewport_to_world(screen)
            .and_then(|ray| closest_point_on_line_to_ray(axis.anchor, axis.direction, ray))
        else {
            return ManipulationUpdate::default();
        };
        let world = drag.start_world + (point - axis.anchor);
        self.constrain(volume.world_to_local(world), volume, snap)
    }

    fn best_screen_axis(
        &self,
        moved: Vec2,
        start_world: Vec3,
        camera: &FrameCamera,
        volume: &BoundingBox,
    ) -> Option<Vec3> {
        let start_screen = camera.project(start_world)?;
        let rotation = self.world_transform(volume).rotation;
        let moved = moved.normalize_or_zero();
        [Vec3::X, Vec3::Y, Vec3::Z]
            .into_iter()
            .map(|axis| rotation * axis)
            .filter_map(|direction| {
                let tip = camera.project(start_world + direction * 0.1)?;
                Some((direction, (tip - start_screen).dot(moved).abs()))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(direction, _)| direction)
    }

    pub fn end_axis_drag(&mut self) {
        self.axis_drag = None;
    }

    /// Begin moving the origin in the horizontal plane through it.
    pub fn start_plane_drag(&mut self, screen: Vec2, camera: &FrameCamera, volume: &BoundingBox) -> bool {
        let start_world = self.world_position(volume);
        let Some(start_hit) = camera
            .viewport_to_world(screen)
            .and_then(|ray| ray_hits_horizontal_plane(ray, start_world.y))
        else {
            return false;
        };
        self.plane_drag = Some(PlaneDrag { start_hit, start_world });
        true
    }

    pub fn update_plane_drag(
        &mut self,
        screen: Vec2,
        camera: &FrameCamera,
        volume: &BoundingBox,
        snap: &mut SnapEngine,
    ) -> ManipulationUpdate {
        let Some(drag) = self.plane_drag else {
            return ManipulationUpdate::default();
        };
        let Some(hit) = camera
            .viewport_to_world(screen)
            .and_then(|ray| ray_hits_horizontal_plane(ray, drag.start_world.y))
        else {
            return ManipulationUpdate::default();
        };
        let world = drag.start_world + Vec3::new(hit.x - drag.start_hit.x, 0.0, hit.z - drag.start_hit.z);
        self.constrain(volume.world_to_local(world), volume, snap)
    }

    pub fn end_plane_drag(&mut self) {
        self.plane_drag = None;
    }

    pub fn rotate_with_snapping(&mut self, delta: f32, snap: &mut SnapEngine) -> ManipulationUpdate {
        let result = snap.rotate_with_snapping(self.yaw, delta);
        let changed = result.value != self.yaw;
        self.yaw = result.value;
        ManipulationUpdate {
            changed,
            pulse: result.pulse,
        }
    }

    /// Scale the displayed gizmo only; the frame itself is unaffected.
    pub fn update_scale(&mut self, factor: f32) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let (min, max) = self.scale_range;
        let scale = (self.display_scale * factor).clamp(min, max);
        let changed = scale != self.display_scale;
        self.display_scale = scale;
        changed
    }

    /// Flash when the tap is within `radius` pixels of the origin on screen,
    /// otherwise move the origin to where the tap meets the volume's bottom face.
    pub fn flash_or_reposition(
        &mut self,
        screen: Vec2,
        camera: &FrameCamera,
        volume: &BoundingBox,
        snap: &mut SnapEngine,
        radius: f32,
    ) -> OriginTap {
        if let Some(on_screen) = camera.project(self.world_position(volume)) {
            if on_screen.distance(screen) <= radius {
                return OriginTap::Flashed;
            }
        }
        let Some(hit) = camera
            .viewport_to_world(screen)
            .and_then(|ray| ray_hits_horizontal_plane(ray, volume.bottom_y()))
        else {
            return OriginTap::Missed;
        };
        let local = volume.world_to_local(hit);
        let half = volume.extent * 0.5;
        if local.x.abs() > half.x || local.z.abs() > half.z {
            return OriginTap::Missed;
        }
        self.constrain(Vec3::new(local.x, -half.y, local.z), volume, snap);
        OriginTap::Repositioned
    }
}
