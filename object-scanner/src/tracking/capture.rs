use bevy::prelude::*;

/// Reference object produced by the tracking collaborator.
///
/// The scanner never looks inside the detection data itself. It only re-expresses
/// the object in another frame, names it and hands it back to the collaborator for
/// merging or detection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCapture {
    pub name: Option<String>,
    /// Center of the captured region in the capture's own frame.
    pub center: Vec3,
    pub extent: Vec3,
    /// Feature points in the capture's own frame.
    pub raw_feature_points: Vec<Vec3>,
}

impl ReferenceCapture {
    pub fn new(center: Vec3, extent: Vec3, raw_feature_points: Vec<Vec3>) -> Self {
        Self {
            name: None,
            center,
            extent,
            raw_feature_points,
        }
    }

    /// Re-express the capture in the frame described by `frame`, which is given
    /// relative to the capture's current frame.
    pub fn applying_transform(&self, frame: Transform) -> Self {
        let inverse = frame.compute_matrix().inverse();
        Self {
            name: self.name.clone(),
            center: inverse.transform_point3(self.center),
            extent: self.extent,
            raw_feature_points: self
                .raw_feature_points
                .iter()
                .map(|p| inverse.transform_point3(*p))
                .collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Still image of the camera view taken when scanning starts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}
