use bevy::prelude::*;

use crate::manipulation::BoundingBox;

/// Feature points gathered while scanning.
///
/// Reference points come from the most recent reference object build and are
/// stored in the local frame of the volume they were extracted from, so they
/// follow the volume when it is moved afterwards. Live points are the raw
/// feature points of the current frame and are replaced every frame. Neither set
/// outlives the session.
#[derive(Debug, Clone, Default)]
pub struct PointCloudAggregator {
    reference_points: Vec<Vec3>,
    live_points: Vec<Vec3>,
    rendered: Vec<Vec3>,
    preliminary: Vec<Vec3>,
    hidden: bool,
    margin: f32,
}

impl PointCloudAggregator {
    pub fn new(margin: f32) -> Self {
        Self {
            margin,
            ..Default::default()
        }
    }

    /// Replace the reference points with a new build result, given in the local
    /// frame of the volume the build was requested for.
    pub fn set_reference_points(&mut self, volume_local: Vec<Vec3>) {
        self.reference_points = volume_local;
    }

    /// Replace the live points with this frame's feature points.
    pub fn update_live_points(&mut self, points: Option<&[Vec3]>) {
        self.live_points.clear();
        if let Some(points) = points {
            self.live_points.extend_from_slice(points);
        }
    }

    pub fn live_points(&self) -> &[Vec3] {
        &self.live_points
    }

    pub fn reference_points(&self) -> &[Vec3] {
        &self.reference_points
    }

    /// Stop visualising points until shown again.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Recompute the visualised subsets for the current volume.
    ///
    /// Only points inside the volume, grown by the margin, are kept. Nothing is
    /// shown before the first reference build or while hidden.
    pub fn refresh(&mut self, volume: Option<&BoundingBox>) {
        self.rendered.clear();
        self.preliminary.clear();
        if self.hidden || self.reference_points.is_empty() {
            return;
        }
        let Some(volume) = volume else {
            return;
        };
        if volume.extent.x <= 0.0 {
            return;
        }
        let bounds = volume.extent * 0.5 + Vec3::splat(self.margin);
        let transform = volume.transform();
        let inverse = transform.compute_matrix().inverse();

        self.rendered.extend(
            self.reference_points
                .iter()
                .filter(|local| local.abs().cmple(bounds).all())
                .map(|local| transform.transform_point(*local)),
        );
        self.preliminary.extend(
            self.live_points
                .iter()
                .copied()
                .filter(|world| inverse.transform_point3(*world).abs().cmple(bounds).all()),
        );
    }

    /// Reference points currently inside the volume, in world space.
    pub fn rendered_points(&self) -> &[Vec3] {
        &self.rendered
    }

    /// Live points currently inside the volume, in world space.
    pub fn preliminary_points(&self) -> &[Vec3] {
        &self.preliminary
    }

    /// Number of reference points currently shown, used as the scan quality
    /// measure.
    pub fn count(&self) -> usize {
        self.rendered.len()
    }
}
