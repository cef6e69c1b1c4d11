#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bevy::prelude::*;
use object_scanner::ObjectScannerPlugin;
use object_scanner::events::ScanEvent;
use object_scanner::tracking::{
    AnchorId, FrameCamera, PlaneAnchor, PreviewImage, ReferenceCapture, TrackingError, TrackingFrame,
    TrackingFuture, TrackingSession,
};

/// Tracking session that resolves every request immediately.
#[derive(Default)]
pub struct FakeTracking {
    pub points: Mutex<Vec<Vec3>>,
    pub fail_merge: Mutex<bool>,
    pub detection_runs: Mutex<usize>,
    pub removed_anchors: Mutex<Vec<AnchorId>>,
    pub resumed: Mutex<usize>,
}

impl TrackingSession for FakeTracking {
    fn create_reference_object(
        &self,
        _transform: Transform,
        extent: Vec3,
    ) -> TrackingFuture<Result<ReferenceCapture, TrackingError>> {
        let capture = ReferenceCapture::new(Vec3::ZERO, extent, self.points.lock().unwrap().clone());
        Box::pin(async move { Ok(capture) })
    }

    fn merge_reference_objects(
        &self,
        base: ReferenceCapture,
        other: ReferenceCapture,
    ) -> TrackingFuture<Result<ReferenceCapture, TrackingError>> {
        let result = if *self.fail_merge.lock().unwrap() {
            Err(TrackingError::MergeFailed("scans do not overlap".into()))
        } else {
            let mut points = base.raw_feature_points.clone();
            points.extend(other.raw_feature_points);
            Ok(ReferenceCapture::new(base.center, base.extent, points))
        };
        Box::pin(async move { result })
    }

    fn run_detection(&self, _capture: &ReferenceCapture) {
        *self.detection_runs.lock().unwrap() += 1;
    }

    fn remove_anchor(&self, anchor: AnchorId) {
        self.removed_anchors.lock().unwrap().push(anchor);
    }

    fn resume_scanning(&self) {
        *self.resumed.lock().unwrap() += 1;
    }

    fn capture_preview_image(&self) -> Option<PreviewImage> {
        Some(PreviewImage {
            width: 2,
            height: 1,
            rgba: vec![255; 8],
        })
    }
}

pub fn app(tracking: Arc<FakeTracking>) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(ObjectScannerPlugin::new(tracking));
    app
}

/// Run one update and collect the scan events it produced.
pub fn step(app: &mut App) -> Vec<ScanEvent> {
    app.update();
    app.world_mut()
        .resource_mut::<Events<ScanEvent>>()
        .drain()
        .collect()
}

pub fn send<E: Event>(app: &mut App, event: E) -> Vec<ScanEvent> {
    app.world_mut().send_event(event);
    step(app)
}

/// Keep updating until `done` matches an event, returning everything seen.
pub fn step_until(app: &mut App, done: impl Fn(&ScanEvent) -> bool) -> Vec<ScanEvent> {
    let mut seen = Vec::new();
    for _ in 0..200 {
        let events = step(app);
        let finished = events.iter().any(&done);
        seen.extend(events);
        if finished {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    seen
}

pub fn camera() -> FrameCamera {
    FrameCamera {
        transform: Transform::from_xyz(0.0, 1.0, 1.0).looking_at(Vec3::new(0.0, 0.1, 0.0), Vec3::Y),
        viewport_size: Vec2::new(1000.0, 1000.0),
        vertical_fov: 90f32.to_radians(),
    }
}

pub fn frame(timestamp: f64) -> TrackingFrame {
    TrackingFrame {
        timestamp,
        camera: camera(),
        plane_anchors: vec![PlaneAnchor { center: Vec3::ZERO }],
        ambient_intensity: Some(1000.0),
        ..Default::default()
    }
}

pub fn screen_center() -> Vec2 {
    Vec2::new(500.0, 500.0)
}
