use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;

use crate::events::{Advisory, ScanEvent, ScanEventQueue};
use crate::settings::DetectionSettings;
use crate::tracking::{AnchorId, PreviewImage, ReferenceCapture, TrackingSession};

/// Detection count and delays of the current test run, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectionStats {
    pub detections: u32,
    pub last_delay: f64,
    pub average_delay: f64,
}

impl DetectionStats {
    /// Fold one more delay into the running mean.
    pub fn record(&mut self, delay: f64) {
        self.detections += 1;
        let n = f64::from(self.detections);
        self.average_delay = (self.average_delay * (n - 1.0) + delay) / n;
        self.last_delay = delay;
    }

    /// Text shown under the detection marker.
    pub fn statistics(&self) -> String {
        format!(
            "Detected after: {:.0} ms. Avg: {:.0} ms",
            self.last_delay * 1000.0,
            self.average_delay * 1000.0
        )
    }
}

/// Box shown where the reference object was detected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionMarker {
    pub transform: Transform,
    /// Bounds of the capture's feature points in the capture frame.
    pub bounds_center: Vec3,
    pub bounds_extent: Vec3,
    /// Seconds the marker stays visible after a detection.
    pub display_duration: f64,
}

impl DetectionMarker {
    fn for_capture(capture: &ReferenceCapture, display_duration: f64) -> Self {
        let (bounds_center, bounds_extent) = fit_bounds(&capture.raw_feature_points)
            .unwrap_or((capture.center, capture.extent));
        Self {
            transform: Transform::IDENTITY,
            bounds_center,
            bounds_extent,
            display_duration,
        }
    }
}

fn fit_bounds(points: &[Vec3]) -> Option<(Vec3, Vec3)> {
    if points.is_empty() {
        return None;
    }
    let (min, max) = points.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    Some(((min + max) * 0.5, max - min))
}

/// Tracks detection of a finished reference object.
///
/// Time is driven by [`TestRunTracker::tick`]. Each detection measures the delay
/// since the run was armed or since the previous detection, drops the reported
/// anchor so the object can be found again, and restarts the no-detection
/// watchdog. The watchdog is a single-shot timer: when it runs out an advisory is
/// raised once and it stays off until the next detection or arm.
#[derive(Resource)]
pub struct TestRunTracker {
    tracking: Arc<dyn TrackingSession>,
    settings: DetectionSettings,
    capture: Option<ReferenceCapture>,
    preview: Option<PreviewImage>,
    stats: DetectionStats,
    marker: Option<DetectionMarker>,
    watchdog: Option<Timer>,
    clock: Duration,
    detection_started: Duration,
    events: ScanEventQueue,
}

impl TestRunTracker {
    /// Idle tracker; nothing runs until [`TestRunTracker::arm`].
    pub fn new(tracking: Arc<dyn TrackingSession>, settings: DetectionSettings) -> Self {
        Self {
            tracking,
            settings,
            capture: None,
            preview: None,
            stats: DetectionStats::default(),
            marker: None,
            watchdog: None,
            clock: Duration::ZERO,
            detection_started: Duration::ZERO,
            events: ScanEventQueue::default(),
        }
    }

    /// Whether a test run is active.
    pub fn is_running(&self) -> bool {
        self.capture.is_some()
    }

    /// Reference object under test.
    pub fn capture(&self) -> Option<&ReferenceCapture> {
        self.capture.as_ref()
    }

    pub fn preview_image(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }

    /// Detection statistics since the run was armed.
    pub fn stats(&self) -> DetectionStats {
        self.stats
    }

    /// Marker of the last detection, or the initial one after arming.
    pub fn marker(&self) -> Option<&DetectionMarker> {
        self.marker.as_ref()
    }

    /// Whether the no-detection watchdog is counting down.
    pub fn watchdog_armed(&self) -> bool {
        self.watchdog.is_some()
    }

    fn arm_watchdog(&mut self) {
        self.watchdog = Some(Timer::from_seconds(
            self.settings.no_detection_timeout,
            TimerMode::Once,
        ));
    }

    fn display_duration(&self) -> f64 {
        self.stats.average_delay + self.settings.display_duration_margin
    }

    /// Start testing `capture`. Any previous run is replaced and its stats reset.
    pub fn arm(&mut self, capture: ReferenceCapture, preview: Option<PreviewImage>) {
        self.stats = DetectionStats::default();
        self.marker = Some(DetectionMarker::for_capture(&capture, self.display_duration()));
        if preview.is_some() {
            self.preview = preview;
        }
        self.detection_started = self.clock;
        self.tracking.run_detection(&capture);
        info!(
            "Test run started for '{}'",
            capture.name.as_deref().unwrap_or("unnamed")
        );
        self.capture = Some(capture);
        self.arm_watchdog();
        self.events.push(ScanEvent::TestRunStarted);
    }

    /// Record a detection reported through `anchor` at `transform`.
    pub fn on_detected(&mut self, anchor: AnchorId, transform: Transform) -> bool {
        if !self.is_running() {
            debug!("Ignoring detection of anchor {anchor:?} outside a test run");
            return false;
        }
        let delay = (self.clock - self.detection_started).as_secs_f64();
        self.stats.record(delay);
        self.detection_started = self.clock;
        self.tracking.remove_anchor(anchor);

        let display_duration = self.display_duration();
        let Some(marker) = self.marker.as_mut() else {
            return false;
        };
        marker.transform = transform;
        marker.display_duration = display_duration;
        let marker = *marker;

        self.arm_watchdog();
        let statistics = self.stats.statistics();
        info!("{statistics}");
        self.events.push(ScanEvent::DetectionUpdated { marker, statistics });
        true
    }

    /// Advance the clock. Returns true when the watchdog ran out during this tick.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.clock += delta;
        let Some(timer) = self.watchdog.as_mut() else {
            return false;
        };
        timer.tick(delta);
        if !timer.just_finished() {
            return false;
        }
        self.watchdog = None;
        warn!("No detection within {}s", self.settings.no_detection_timeout);
        self.events.push(ScanEvent::Advisory(Advisory::NoDetection));
        true
    }

    /// End the test run and hand the collaborator back to scanning.
    pub fn stop(&mut self) {
        if self.capture.take().is_none() {
            return;
        }
        self.marker = None;
        self.watchdog = None;
        self.tracking.resume_scanning();
        info!("Test run stopped");
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, ScanEvent> {
        self.events.drain()
    }
}
