use bevy::prelude::*;

use super::ray::ray_hits_obb;
use crate::settings::ScanSettings;
use crate::tracking::FrameCamera;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxFace {
    Right,
    Left,
    Top,
    Bottom,
    Front,
    Back,
}

impl BoxFace {
    pub const ALL: [BoxFace; 6] = [
        BoxFace::Right,
        BoxFace::Left,
        BoxFace::Top,
        BoxFace::Bottom,
        BoxFace::Front,
        BoxFace::Back,
    ];

    pub fn from_normal(normal: Vec3) -> Self {
        match (normal.x, normal.y, normal.z) {
            (x, _, _) if x > 0.5 => Self::Right,
            (x, _, _) if x < -0.5 => Self::Left,
            (_, y, _) if y > 0.5 => Self::Top,
            (_, y, _) if y < -0.5 => Self::Bottom,
            (_, _, z) if z > 0.5 => Self::Front,
            _ => Self::Back,
        }
    }

    pub fn normal(&self) -> Vec3 {
        match self {
            Self::Right => Vec3::X,
            Self::Left => Vec3::NEG_X,
            Self::Top => Vec3::Y,
            Self::Bottom => Vec3::NEG_Y,
            Self::Front => Vec3::Z,
            Self::Back => Vec3::NEG_Z,
        }
    }

    /// Axis index of the face normal.
    pub fn axis(&self) -> usize {
        match self {
            Self::Right | Self::Left => 0,
            Self::Top | Self::Bottom => 1,
            Self::Front | Self::Back => 2,
        }
    }

    /// The two in-plane axis indices, used as tile columns and rows.
    fn plane_axes(&self) -> (usize, usize) {
        match self.axis() {
            0 => (2, 1),
            1 => (0, 2),
            _ => (0, 1),
        }
    }
}

/// A patch of a volume face tracking whether the camera has looked at it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tile {
    pub is_captured: bool,
    pub is_highlighted: bool,
}

#[derive(Debug, Clone)]
pub struct FaceTiles {
    pub face: BoxFace,
    pub columns: usize,
    pub rows: usize,
    pub tiles: Vec<Tile>,
}

impl FaceTiles {
    fn new(face: BoxFace, extent: Vec3, max_tile_size: f32) -> Self {
        let (u, v) = face.plane_axes();
        let columns = ((extent[u] / max_tile_size).ceil() as usize).max(1);
        let rows = ((extent[v] / max_tile_size).ceil() as usize).max(1);
        Self {
            face,
            columns,
            rows,
            tiles: vec![Tile::default(); columns * rows],
        }
    }

    /// Share of captured tiles on this face.
    pub fn completion(&self) -> f32 {
        let captured = self.tiles.iter().filter(|tile| tile.is_captured).count();
        captured as f32 / self.tiles.len() as f32
    }

    fn index_of(&self, local_point: Vec3, extent: Vec3) -> usize {
        let (u, v) = self.face.plane_axes();
        let cell = |axis: usize, count: usize| {
            let normalized = (local_point[axis] + extent[axis] * 0.5) / extent[axis].max(f32::EPSILON);
            ((normalized * count as f32).floor() as isize).clamp(0, count as isize - 1) as usize
        };
        cell(v, self.rows) * self.columns + cell(u, self.columns)
    }
}

#[derive(Debug, Clone, Copy)]
struct CoverageRay {
    origin: Vec3,
    direction: Vec3,
}

/// Capture progress over the tiles of a volume's faces.
///
/// A camera ray is recorded every few frames and tested against the volume. All
/// recorded rays are tested again whenever the volume pose changes, so coverage
/// gathered before a nudge still lands on the tiles it now hits.
#[derive(Debug, Clone)]
pub struct CoverageTracker {
    faces: Vec<FaceTiles>,
    extent: Vec3,
    rays: Vec<CoverageRay>,
    /// Rays already applied against `applied_pose`.
    applied_rays: usize,
    applied_pose: Option<Transform>,
    frame_counter: u32,
    highlighted: Option<(BoxFace, usize)>,
    progress_percentage: u32,
    max_tile_size: f32,
    ray_frame_interval: u32,
    ray_length: f32,
    captured_opacity: f32,
    highlight_opacity: f32,
}

impl CoverageTracker {
    pub fn new(extent: Vec3, settings: &ScanSettings) -> Self {
        let mut tracker = Self {
            faces: Vec::new(),
            extent,
            rays: Vec::new(),
            applied_rays: 0,
            applied_pose: None,
            frame_counter: 0,
            highlighted: None,
            progress_percentage: 0,
            max_tile_size: settings.max_tile_size,
            ray_frame_interval: settings.coverage_ray_frame_interval.max(1),
            ray_length: settings.coverage_ray_length,
            captured_opacity: settings.tile_captured_opacity,
            highlight_opacity: settings.tile_highlight_opacity,
        };
        tracker.rebuild(extent);
        tracker
    }

    /// Recreate all tiles for a new extent, discarding progress.
    pub fn rebuild(&mut self, extent: Vec3) {
        self.extent = extent;
        self.faces = BoxFace::ALL
            .iter()
            .map(|face| FaceTiles::new(*face, extent, self.max_tile_size))
            .collect();
        self.rays.clear();
        self.applied_rays = 0;
        self.applied_pose = None;
        self.frame_counter = 0;
        self.highlighted = None;
        self.progress_percentage = 0;
    }

    pub fn extent(&self) -> Vec3 {
        self.extent
    }

    /// Render opacity of a tile: the captured share plus the highlight share.
    pub fn tile_opacity(&self, tile: &Tile) -> f32 {
        let mut opacity = if tile.is_captured { self.captured_opacity } else { 0.0 };
        if tile.is_highlighted {
            opacity += self.highlight_opacity;
        }
        opacity
    }

    fn tile_hit_by(&self, volume: Transform, origin: Vec3, direction: Vec3) -> Option<(BoxFace, usize)> {
        let hit = ray_hits_obb(origin, direction, volume, self.extent)?;
        if hit.t > self.ray_length {
            return None;
        }
        let face = BoxFace::from_normal(hit.local_normal);
        let tiles = self.faces.iter().find(|f| f.face == face)?;
        Some((face, tiles.index_of(hit.local_point, self.extent)))
    }

    fn tile_mut(&mut self, face: BoxFace, index: usize) -> Option<&mut Tile> {
        self.faces
            .iter_mut()
            .find(|f| f.face == face)
            .and_then(|f| f.tiles.get_mut(index))
    }

    fn camera_inside(&self, volume: Transform, camera: &FrameCamera) -> bool {
        let local = volume.compute_matrix().inverse().transform_point3(camera.position());
        let half = self.extent * 0.5;
        local.abs().cmple(half).all()
    }

    /// Highlight the tile under the view center, clearing the previous highlight.
    pub fn highlight_current_tile(&mut self, volume: Transform, camera: &FrameCamera) {
        if self.camera_inside(volume, camera) {
            return;
        }
        let Some(ray) = camera.center_ray() else {
            return;
        };
        let hit = self.tile_hit_by(volume, ray.origin, *ray.direction);
        if hit == self.highlighted {
            return;
        }
        if let Some((face, index)) = self.highlighted.take() {
            if let Some(tile) = self.tile_mut(face, index) {
                tile.is_highlighted = false;
            }
        }
        if let Some((face, index)) = hit {
            if let Some(tile) = self.tile_mut(face, index) {
                tile.is_highlighted = true;
            }
            self.highlighted = hit;
        }
    }

    /// Record camera coverage and recompute progress; returns the new percentage
    /// when it changed.
    pub fn update_capturing_progress(&mut self, volume: Transform, camera: &FrameCamera) -> Option<u32> {
        if self.camera_inside(volume, camera) {
            return None;
        }
        self.frame_counter += 1;
        if self.frame_counter % self.ray_frame_interval == 0 {
            self.frame_counter = 0;
            self.rays.push(CoverageRay {
                origin: camera.position(),
                direction: camera.forward(),
            });
        }

        if self.applied_pose != Some(volume) {
            self.applied_pose = Some(volume);
            self.applied_rays = 0;
        }
        let hits: Vec<(BoxFace, usize)> = self.rays[self.applied_rays..]
            .iter()
            .filter_map(|ray| self.tile_hit_by(volume, ray.origin, ray.direction))
            .collect();
        self.applied_rays = self.rays.len();
        for (face, index) in hits {
            if let Some(tile) = self.tile_mut(face, index) {
                tile.is_captured = true;
            }
        }

        let sum: f32 = self
            .faces
            .iter()
            .filter(|f| f.face != BoxFace::Bottom)
            .map(|f| f.completion() / 5.0)
            .sum();
        let percentage = ((sum * 100.0).floor() as u32).min(100);
        if percentage != self.progress_percentage {
            self.progress_percentage = percentage;
            return Some(percentage);
        }
        None
    }

    pub fn progress_percentage(&self) -> u32 {
        self.progress_percentage
    }

    /// Tiles of all six faces.
    pub fn faces(&self) -> &[FaceTiles] {
        &self.faces
    }

    pub fn highlighted(&self) -> Option<(BoxFace, usize)> {
        self.highlighted
    }

    #[cfg(test)]
    fn pending_rays(&self) -> usize {
        self.rays.len() - self.applied_rays
    }

    #[cfg(test)]
    pub(crate) fn capture_all(&mut self) {
        for face in &mut self.faces {
            for tile in &mut face.tiles {
                tile.is_captured = true;
            }
        }
        self.progress_percentage = 100;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_looking_at(position: Vec3, target: Vec3) -> FrameCamera {
        FrameCamera {
            transform: Transform::from_translation(position).looking_at(target, Vec3::Y),
            viewport_size: Vec2::new(1000.0, 1000.0),
            vertical_fov: 60f32.to_radians(),
        }
    }

    fn settings() -> ScanSettings {
        ScanSettings {
            coverage_ray_frame_interval: 1,
            ..ScanSettings::default()
        }
    }

    #[test]
    fn tile_opacity_sums_captured_and_highlighted() {
        let tracker = CoverageTracker::new(Vec3::splat(0.3), &settings());
        let tile = Tile {
            is_captured: true,
            is_highlighted: true,
        };
        assert!((tracker.tile_opacity(&tile) - 0.85).abs() < 1e-6);
        assert_eq!(tracker.tile_opacity(&Tile::default()), 0.0);

        let faint = CoverageTracker::new(
            Vec3::splat(0.3),
            &ScanSettings {
                tile_captured_opacity: 0.2,
                tile_highlight_opacity: 0.1,
                ..settings()
            },
        );
        assert!((faint.tile_opacity(&tile) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn faces_are_split_into_small_tiles() {
        let tracker = CoverageTracker::new(Vec3::new(0.25, 0.1, 0.4), &settings());
        let front = tracker.faces().iter().find(|f| f.face == BoxFace::Front).unwrap();
        assert_eq!((front.columns, front.rows), (3, 1));
        let top = tracker.faces().iter().find(|f| f.face == BoxFace::Top).unwrap();
        assert_eq!((top.columns, top.rows), (3, 4));
    }

    #[test]
    fn looking_at_front_face_captures_a_tile() {
        let mut tracker = CoverageTracker::new(Vec3::splat(0.3), &settings());
        let camera = camera_looking_at(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO);
        let progress = tracker.update_capturing_progress(Transform::IDENTITY, &camera);
        assert_eq!(progress, Some(2));
        let front = tracker.faces().iter().find(|f| f.face == BoxFace::Front).unwrap();
        assert_eq!(front.tiles.iter().filter(|t| t.is_captured).count(), 1);
    }

    #[test]
    fn progress_ignores_bottom_face() {
        let mut tracker = CoverageTracker::new(Vec3::splat(0.1), &settings());
        let camera = camera_looking_at(Vec3::new(0.0, -1.0, 0.001), Vec3::ZERO);
        assert_eq!(tracker.update_capturing_progress(Transform::IDENTITY, &camera), None);
        assert_eq!(tracker.progress_percentage(), 0);
    }

    #[test]
    fn highlight_moves_between_tiles() {
        let mut tracker = CoverageTracker::new(Vec3::splat(0.1), &settings());
        let front = camera_looking_at(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO);
        tracker.highlight_current_tile(Transform::IDENTITY, &front);
        assert_eq!(tracker.highlighted(), Some((BoxFace::Front, 0)));

        let right = camera_looking_at(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        tracker.highlight_current_tile(Transform::IDENTITY, &right);
        assert_eq!(tracker.highlighted(), Some((BoxFace::Right, 0)));
        let highlighted: usize = tracker
            .faces()
            .iter()
            .map(|f| f.tiles.iter().filter(|t| t.is_highlighted).count())
            .sum();
        assert_eq!(highlighted, 1);
    }

    #[test]
    fn camera_inside_volume_records_nothing() {
        let mut tracker = CoverageTracker::new(Vec3::splat(1.0), &settings());
        let camera = camera_looking_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(tracker.update_capturing_progress(Transform::IDENTITY, &camera), None);
    }

    #[test]
    fn recorded_rays_are_tested_again_only_after_the_volume_moves() {
        let mut tracker = CoverageTracker::new(Vec3::splat(0.3), &settings());
        let camera = camera_looking_at(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO);
        for _ in 0..3 {
            tracker.update_capturing_progress(Transform::IDENTITY, &camera);
            assert_eq!(tracker.pending_rays(), 0);
        }
        assert_eq!(tracker.rays.len(), 3);
        assert_eq!(tracker.applied_rays, 3);

        // Nudged to the right: the old rays now hit another front tile.
        let nudged = Transform::from_xyz(0.1, 0.0, 0.0);
        let captured_before = tracker.faces().iter().find(|f| f.face == BoxFace::Front).unwrap().completion();
        tracker.update_capturing_progress(nudged, &camera);
        assert_eq!(tracker.applied_rays, 4);
        let front = tracker.faces().iter().find(|f| f.face == BoxFace::Front).unwrap();
        assert!(front.completion() > captured_before);
    }

    #[test]
    fn rebuild_discards_progress() {
        let mut tracker = CoverageTracker::new(Vec3::splat(0.3), &settings());
        let camera = camera_looking_at(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO);
        tracker.update_capturing_progress(Transform::IDENTITY, &camera);
        tracker.rebuild(Vec3::splat(0.4));
        assert_eq!(tracker.progress_percentage(), 0);
        assert!(tracker.faces().iter().all(|f| f.completion() == 0.0));
    }
}
