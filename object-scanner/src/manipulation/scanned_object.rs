use bevy::prelude::*;

use super::bounding_box::{BoundingBox, fit_bounds};
use super::origin::{ManipulationUpdate, ObjectOrigin, OriginTap};
use super::ray::ray_hits_horizontal_plane;
use super::snapping::SnapEngine;
use crate::settings::{GestureSettings, ScanSettings, SnapSettings};
use crate::tracking::{FrameCamera, PlaneAnchor};

/// What a tap did to the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTap {
    /// The ghost was frozen into the confirmed volume.
    Confirmed,
    /// The confirmed volume moved to the tapped spot.
    Moved,
    Ignored,
}

/// The object being scanned: the provisional ghost volume, the confirmed volume
/// and, once the user adjusts it, the origin.
///
/// Volume gestures act on the confirmed volume when one exists, otherwise on
/// the ghost. Every volume change is followed by a horizontal plane snap, and
/// keeps the origin inside the confirmed volume.
#[derive(Debug, Clone)]
pub struct ScannedObject {
    ghost: Option<BoundingBox>,
    confirmed: Option<BoundingBox>,
    origin: Option<ObjectOrigin>,
    snap: SnapEngine,
    scan: ScanSettings,
    axis_lock_distance: f32,
    origin_tap_radius: f32,
}

impl ScannedObject {
    pub fn new(scan: ScanSettings, snapping: SnapSettings, gestures: &GestureSettings) -> Self {
        Self {
            ghost: None,
            confirmed: None,
            origin: None,
            snap: SnapEngine::new(snapping),
            scan,
            axis_lock_distance: gestures.axis_lock_distance,
            origin_tap_radius: gestures.origin_tap_radius,
        }
    }

    /// Unconfirmed volume following the feature points.
    pub fn ghost(&self) -> Option<&BoundingBox> {
        self.ghost.as_ref()
    }

    /// Volume frozen by the operator.
    pub fn confirmed(&self) -> Option<&BoundingBox> {
        self.confirmed.as_ref()
    }

    pub fn confirmed_mut(&mut self) -> Option<&mut BoundingBox> {
        self.confirmed.as_mut()
    }

    /// Confirmed volume, falling back to the ghost.
    pub fn either(&self) -> Option<&BoundingBox> {
        self.confirmed.as_ref().or(self.ghost.as_ref())
    }

    pub fn origin(&self) -> Option<&ObjectOrigin> {
        self.origin.as_ref()
    }

    /// Refit the ghost around the live points. A ghost is created the first time
    /// a fit succeeds, or at the default size where the view center meets a
    /// plane when too few points are around.
    pub fn update_ghost(&mut self, points: &[Vec3], camera: &FrameCamera, planes: &[PlaneAnchor]) -> bool {
        if self.confirmed.is_some() {
            return false;
        }
        match self.ghost.as_mut() {
            Some(ghost) if ghost.is_being_dragged() => false,
            Some(ghost) => ghost.fit_over_point_cloud(points, camera, &self.scan),
            None => {
                let placed = fit_bounds(points, camera, &self.scan).or_else(|| {
                    let extent = Vec3::splat(self.scan.ghost_default_extent);
                    default_ghost_center(camera, planes, extent).map(|center| (center, extent))
                });
                let Some((center, extent)) = placed else {
                    return false;
                };
                debug!("Placed ghost volume at {center:?} with extent {extent:?}");
                self.ghost = Some(BoundingBox::new(center, extent, &self.scan));
                true
            }
        }
    }

    /// Replace the ghost with a frozen confirmed copy.
    pub fn confirm_ghost(&mut self) -> bool {
        if self.confirmed.is_some() {
            return false;
        }
        let Some(mut ghost) = self.ghost.take() else {
            return false;
        };
        ghost.end_face_drag();
        ghost.end_ground_plane_drag();
        self.confirmed = Some(BoundingBox::new(ghost.position, ghost.extent, &self.scan));
        if let Some(confirmed) = self.confirmed.as_mut() {
            confirmed.yaw = ghost.yaw;
        }
        true
    }

    /// Create the origin at the bottom center of the confirmed volume unless one
    /// exists already.
    pub fn create_origin(&mut self) -> bool {
        if self.origin.is_some() {
            return false;
        }
        let Some(volume) = self.confirmed.as_ref() else {
            return false;
        };
        self.origin = Some(ObjectOrigin::at_bottom_center(volume, self.scan.origin_scale_range));
        true
    }

    /// Screen position of whatever a gesture would manipulate.
    pub fn object_on_screen(&self, camera: &FrameCamera) -> Option<Vec2> {
        match (self.origin.as_ref(), self.confirmed.as_ref()) {
            (Some(origin), Some(volume)) => camera.project(origin.world_position(volume)),
            _ => self.either().and_then(|volume| camera.project(volume.position)),
        }
    }

    fn manipulate_volume(
        &mut self,
        planes: &[PlaneAnchor],
        change: impl FnOnce(&mut BoundingBox) -> bool,
    ) -> ManipulationUpdate {
        let Some(volume) = self.confirmed.as_mut().or(self.ghost.as_mut()) else {
            return ManipulationUpdate::default();
        };
        if !change(volume) {
            return ManipulationUpdate::default();
        }
        let snapped = self.snap.snap_to_horizontal_plane(volume.position.y, volume.extent.y, planes);
        volume.position.y = snapped.value;
        if let (Some(origin), Some(confirmed)) = (self.origin.as_mut(), self.confirmed.as_ref()) {
            origin.clamp_into(confirmed);
        }
        ManipulationUpdate {
            changed: true,
            pulse: snapped.pulse,
        }
    }

    pub fn start_face_drag(&mut self, screen: Vec2, camera: &FrameCamera, symmetric: bool) -> bool {
        let Some(ray) = camera.viewport_to_world(screen) else {
            return false;
        };
        self.confirmed
            .as_mut()
            .or(self.ghost.as_mut())
            .is_some_and(|volume| volume.start_face_drag(ray, symmetric))
    }

    pub fn update_face_drag(&mut self, screen: Vec2, camera: &FrameCamera, planes: &[PlaneAnchor]) -> ManipulationUpdate {
        let Some(ray) = camera.viewport_to_world(screen) else {
            return ManipulationUpdate::default();
        };
        self.manipulate_volume(planes, |volume| volume.update_face_drag(ray))
    }

    pub fn start_ground_drag(&mut self, screen: Vec2, camera: &FrameCamera) -> bool {
        let Some(ray) = camera.viewport_to_world(screen) else {
            return false;
        };
        self.confirmed
            .as_mut()
            .or(self.ghost.as_mut())
            .is_some_and(|volume| volume.start_ground_plane_drag(ray))
    }

    pub fn update_ground_drag(
        &mut self,
        screen: Vec2,
        camera: &FrameCamera,
        planes: &[PlaneAnchor],
    ) -> ManipulationUpdate {
        let Some(ray) = camera.viewport_to_world(screen) else {
            return ManipulationUpdate::default();
        };
        self.manipulate_volume(planes, |volume| volume.update_ground_plane_drag(ray))
    }

    pub fn end_volume_drags(&mut self) {
        for volume in [self.confirmed.as_mut(), self.ghost.as_mut()].into_iter().flatten() {
            volume.end_face_drag();
            volume.end_ground_plane_drag();
        }
    }

    /// Rotate the confirmed volume, or the ghost before confirmation.
    pub fn rotate_volume(&mut self, angle: f32, planes: &[PlaneAnchor]) -> ManipulationUpdate {
        if angle == 0.0 {
            return ManipulationUpdate::default();
        }
        self.manipulate_volume(planes, |volume| {
            volume.rotate_on_y_axis(angle);
            true
        })
    }

    /// Scale the volume, keeping its bottom on the floor.
    pub fn scale_volume(&mut self, factor: f32, planes: &[PlaneAnchor]) -> ManipulationUpdate {
        self.manipulate_volume(planes, |volume| volume.scale(factor))
    }

    /// Confirm the ghost, or move the confirmed volume to the tapped spot.
    pub fn tap_volume(&mut self, screen: Vec2, camera: &FrameCamera, planes: &[PlaneAnchor]) -> VolumeTap {
        if self.confirmed.is_none() {
            return if self.confirm_ghost() {
                VolumeTap::Confirmed
            } else {
                VolumeTap::Ignored
            };
        }
        let Some(ray) = camera.viewport_to_world(screen) else {
            return VolumeTap::Ignored;
        };
        if self.manipulate_volume(planes, |volume| volume.move_to(ray)).changed {
            VolumeTap::Moved
        } else {
            VolumeTap::Ignored
        }
    }

    pub fn start_origin_axis_drag(&mut self, screen: Vec2) -> bool {
        let (Some(origin), Some(volume)) = (self.origin.as_mut(), self.confirmed.as_ref()) else {
            return false;
        };
        origin.start_axis_drag(screen, volume);
        true
    }

    pub fn update_origin_axis_drag(&mut self, screen: Vec2, camera: &FrameCamera) -> ManipulationUpdate {
        let (Some(origin), Some(volume)) = (self.origin.as_mut(), self.confirmed.as_ref()) else {
            return ManipulationUpdate::default();
        };
        origin.update_axis_drag(screen, camera, volume, &mut self.snap, self.axis_lock_distance)
    }

    pub fn start_origin_plane_drag(&mut self, screen: Vec2, camera: &FrameCamera) -> bool {
        let (Some(origin), Some(volume)) = (self.origin.as_mut(), self.confirmed.as_ref()) else {
            return false;
        };
        origin.start_plane_drag(screen, camera, volume)
    }

    pub fn update_origin_plane_drag(&mut self, screen: Vec2, camera: &FrameCamera) -> ManipulationUpdate {
        let (Some(origin), Some(volume)) = (self.origin.as_mut(), self.confirmed.as_ref()) else {
            return ManipulationUpdate::default();
        };
        origin.update_plane_drag(screen, camera, volume, &mut self.snap)
    }

    pub fn end_origin_drags(&mut self) {
        if let Some(origin) = self.origin.as_mut() {
            origin.end_axis_drag();
            origin.end_plane_drag();
        }
    }

    /// Rotate the origin, snapping to quarter turns.
    pub fn rotate_origin(&mut self, delta: f32) -> ManipulationUpdate {
        match self.origin.as_mut() {
            Some(origin) => origin.rotate_with_snapping(delta, &mut self.snap),
            None => ManipulationUpdate::default(),
        }
    }

    pub fn scale_origin(&mut self, factor: f32) -> bool {
        self.origin.as_mut().is_some_and(|origin| origin.update_scale(factor))
    }

    pub fn tap_origin(&mut self, screen: Vec2, camera: &FrameCamera) -> OriginTap {
        let (Some(origin), Some(volume)) = (self.origin.as_mut(), self.confirmed.as_ref()) else {
            return OriginTap::Missed;
        };
        origin.flash_or_reposition(screen, camera, volume, &mut self.snap, self.origin_tap_radius)
    }
}

fn default_ghost_center(camera: &FrameCamera, planes: &[PlaneAnchor], extent: Vec3) -> Option<Vec3> {
    let ray = camera.center_ray()?;
    planes
        .iter()
        .filter_map(|plane| ray_hits_horizontal_plane(ray, plane.height()))
        .min_by(|a, b| a.distance_squared(ray.origin).total_cmp(&b.distance_squared(ray.origin)))
        .map(|hit| hit + Vec3::Y * extent.y * 0.5)
}
