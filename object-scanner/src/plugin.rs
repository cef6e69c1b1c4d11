use std::sync::Arc;

use bevy::prelude::*;

use crate::detection::{SessionInfo, TestRunTracker};
use crate::error::ScanError;
use crate::events::{
    FinalizeScanRequest, MergeCandidate, MergeResolution, ObjectDetected, PromptResponse, ScanEvent, StartTestRun,
    StopTestRun, TrackingFrameEvent, TransitionRequest,
};
use crate::gestures::GestureInput;
use crate::scan::ScanSession;
use crate::settings::ScannerSettings;
use crate::tracking::TrackingSession;

/// Plugin wiring the scanner into an app driven by a tracking session.
///
/// Input arrives as events (frames, gestures, operator requests); everything the
/// scanner reports is written as [`ScanEvent`]s at the end of each update.
pub struct ObjectScannerPlugin {
    tracking: Arc<dyn TrackingSession>,
    settings: ScannerSettings,
}

impl ObjectScannerPlugin {
    pub fn new(tracking: Arc<dyn TrackingSession>) -> Self {
        Self {
            tracking,
            settings: ScannerSettings::default(),
        }
    }

    /// Replace the default tuning values.
    pub fn with_settings(mut self, settings: ScannerSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Plugin for ObjectScannerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .insert_resource(ScanSession::new(self.tracking.clone(), &self.settings))
            .insert_resource(TestRunTracker::new(
                self.tracking.clone(),
                self.settings.detection.clone(),
            ))
            .insert_resource(SessionInfo::new(self.settings.detection.clone()))
            .add_event::<GestureInput>()
            .add_event::<TrackingFrameEvent>()
            .add_event::<TransitionRequest>()
            .add_event::<PromptResponse>()
            .add_event::<MergeResolution>()
            .add_event::<MergeCandidate>()
            .add_event::<FinalizeScanRequest>()
            .add_event::<StartTestRun>()
            .add_event::<StopTestRun>()
            .add_event::<ObjectDetected>()
            .add_event::<ScanEvent>()
            .add_systems(
                Update,
                (
                    tick_timers,
                    handle_tracking_frames,
                    handle_gestures,
                    handle_workflow_requests,
                    poll_reference_builds,
                    handle_test_run_requests,
                    flush_scan_events,
                )
                    .chain(),
            );
        info!("Object scanner plugin initialised");
    }
}

/// System advancing the watchdog and message timers.
fn tick_timers(time: Res<Time>, mut tracker: ResMut<TestRunTracker>, mut info: ResMut<SessionInfo>) {
    tracker.tick(time.delta());
    info.tick(time.delta());
}

/// System feeding tracking frames to the workflow and the session info line.
fn handle_tracking_frames(
    mut frames: EventReader<TrackingFrameEvent>,
    mut session: ResMut<ScanSession>,
    mut info: ResMut<SessionInfo>,
    tracker: Res<TestRunTracker>,
) {
    for TrackingFrameEvent(frame) in frames.read() {
        info.update_for_tracking_state(frame.tracking_state, tracker.is_running());
        if !tracker.is_running() {
            session.process_frame(frame);
        }
    }
}

/// System routing touch gestures to the workflow.
fn handle_gestures(
    mut gestures: EventReader<GestureInput>,
    mut session: ResMut<ScanSession>,
    tracker: Res<TestRunTracker>,
) {
    if tracker.is_running() {
        gestures.clear();
        return;
    }
    for gesture in gestures.read() {
        session.handle_gesture(gesture);
    }
}

fn log_rejected(action: &str, result: Result<(), ScanError>) {
    if let Err(err) = result {
        warn!("{action} rejected: {err}");
    }
}

/// System applying operator requests to the workflow.
fn handle_workflow_requests(
    mut transitions: EventReader<TransitionRequest>,
    mut responses: EventReader<PromptResponse>,
    mut candidates: EventReader<MergeCandidate>,
    mut finalize_requests: EventReader<FinalizeScanRequest>,
    mut resolutions: EventReader<MergeResolution>,
    mut session: ResMut<ScanSession>,
) {
    for MergeCandidate(capture) in candidates.read() {
        session.set_merge_candidate(capture.clone());
    }
    for TransitionRequest(target) in transitions.read() {
        // Rejections are logged by the session.
        let _ = session.request_transition(*target);
    }
    for PromptResponse(choice) in responses.read() {
        log_rejected("Prompt response", session.respond_to_prompt(*choice));
    }
    for _ in finalize_requests.read() {
        log_rejected("Finalizing the scan", session.finalize());
    }
    for MergeResolution(choice) in resolutions.read() {
        log_rejected("Merge resolution", session.resolve_merge(*choice));
    }
}

/// System applying finished extraction and merge work.
fn poll_reference_builds(mut session: ResMut<ScanSession>) {
    session.poll_builder();
}

/// System starting, stopping and feeding the detection test run.
fn handle_test_run_requests(
    mut starts: EventReader<StartTestRun>,
    mut stops: EventReader<StopTestRun>,
    mut detections: EventReader<ObjectDetected>,
    session: Res<ScanSession>,
    mut tracker: ResMut<TestRunTracker>,
) {
    for _ in starts.read() {
        match session.capture() {
            Some(capture) => tracker.arm(capture.clone(), session.preview_image().cloned()),
            None => warn!("Test run rejected: {}", ScanError::NoReferenceObject),
        }
    }
    for detection in detections.read() {
        tracker.on_detected(detection.anchor, detection.transform);
    }
    for _ in stops.read() {
        tracker.stop();
    }
}

/// System writing everything queued by the components as [`ScanEvent`]s.
fn flush_scan_events(
    mut session: ResMut<ScanSession>,
    mut tracker: ResMut<TestRunTracker>,
    mut info: ResMut<SessionInfo>,
    mut writer: EventWriter<ScanEvent>,
) {
    let mut pending: Vec<ScanEvent> = session.drain_events().collect();
    pending.extend(tracker.drain_events());

    // Advisories are also shown in the session info line.
    for event in &pending {
        if let ScanEvent::Advisory(advisory) = event {
            info.display_advisory(*advisory);
        }
    }
    pending.extend(info.drain_events());

    for event in pending {
        writer.write(event);
    }
}
