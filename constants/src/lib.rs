pub mod detection;
pub mod gesture;
pub mod scan;
pub mod snapping;
