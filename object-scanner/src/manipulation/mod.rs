//! Bounding volume and origin manipulation.
//!
//! Screen gestures are turned into rays through the frame camera and intersected
//! with the volume, its faces, or horizontal planes. The resulting poses pass
//! through the snap engine before they are committed:
//!
//! - volume bottom onto detected horizontal planes
//! - origin onto the volume's sides and onto its vertical center line
//! - origin rotation onto multiples of 90°
//!
//! Each face of the confirmed volume also carries a grid of coverage tiles used to
//! measure how much of the object the camera has seen.

/// The scanned volume and its drags.
pub mod bounding_box;

/// Origin frame inside the volume.
pub mod origin;

/// Ray casting helpers.
pub mod ray;

/// Ghost and confirmed volume ownership.
pub mod scanned_object;

/// Hysteresis snapping.
pub mod snapping;

/// Face tiles and capture progress.
pub mod tiles;

pub use bounding_box::BoundingBox;
pub use origin::{ManipulationUpdate, ObjectOrigin, OriginTap};
pub use scanned_object::{ScannedObject, VolumeTap};
pub use snapping::{SnapEngine, SnapLatch, Snapped};
pub use tiles::{BoxFace, CoverageTracker, FaceTiles, Tile};
