//! Guided capture of physical objects as reference objects for detection.
//!
//! The scanner sits between a platform tracking session and its UI. It walks the
//! operator through placing a bounding volume around an object, scanning it from
//! all sides and choosing the object's origin, then builds a reference object
//! through the tracking session and tests how reliably it is detected.
//!
//! Everything is driven through [`plugin::ObjectScannerPlugin`]; the component
//! types can also be used directly.

pub mod detection;
pub mod error;
pub mod events;
pub mod gestures;
pub mod manipulation;
pub mod plugin;
pub mod point_cloud;
pub mod reference;
pub mod scan;
pub mod settings;
pub mod tracking;

pub use error::ScanError;
pub use plugin::ObjectScannerPlugin;
pub use settings::ScannerSettings;
