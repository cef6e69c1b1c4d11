//! Reference object construction.
//!
//! While scanning, the confirmed volume is periodically extracted into a
//! preliminary reference object whose feature points feed the point cloud
//! visualisation. Finalizing extracts once more, re-expresses the result in the
//! origin's frame, names it, and optionally merges it with the capture of an
//! earlier scan. A failed merge leaves both captures intact until the operator
//! picks one.

pub mod builder;

pub use builder::{BuilderUpdate, MergeChoice, MergeConflict, ReferenceObjectBuilder};
