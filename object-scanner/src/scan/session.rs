use std::sync::Arc;

use bevy::prelude::*;

use super::prompts::{PendingTransition, PromptChoice, PromptResolution, ScanPrompt};
use super::state::ScanState;
use crate::error::ScanError;
use crate::events::{ScanEvent, ScanEventQueue};
use crate::gestures::{ThresholdPan, ThresholdPinch, ThresholdRotation};
use crate::manipulation::{BoundingBox, ScannedObject};
use crate::point_cloud::PointCloudAggregator;
use crate::reference::{BuilderUpdate, MergeChoice, ReferenceObjectBuilder};
use crate::settings::{ScanSettings, ScannerSettings};
use crate::tracking::{FrameCamera, PlaneAnchor, PreviewImage, ReferenceCapture, TrackingSession};

const DEFAULT_SCAN_NAME: &str = "Scan";

/// The scanning workflow: current stage, the object being scanned, its point
/// cloud and the reference object built from it.
///
/// Transitions only move one stage forward and are checked against the scanned
/// volume. When a check fails softly a prompt is raised and the transition waits
/// in [`PendingTransition`] until the operator answers; nothing changes before
/// that. Everything the outside world needs to know is queued as [`ScanEvent`]s.
#[derive(Resource)]
pub struct ScanSession {
    pub(super) tracking: Arc<dyn TrackingSession>,
    pub(super) settings: ScanSettings,
    pub(super) state: ScanState,
    pub(super) object: ScannedObject,
    pub(super) point_cloud: PointCloudAggregator,
    pub(super) builder: ReferenceObjectBuilder,
    pending: Option<PendingTransition>,
    capture: Option<ReferenceCapture>,
    merge_candidate: Option<ReferenceCapture>,
    preview: Option<PreviewImage>,
    pub(super) warned_low_light: bool,
    scan_name: String,
    pub(super) camera: FrameCamera,
    pub(super) planes: Vec<PlaneAnchor>,
    pub(super) pan: ThresholdPan,
    pub(super) pan_active: bool,
    pub(super) pinch: ThresholdPinch,
    pub(super) rotation: ThresholdRotation,
    pub(super) events: ScanEventQueue,
}

impl ScanSession {
    /// Fresh session in `ready`, with thresholds taken from `settings`.
    pub fn new(tracking: Arc<dyn TrackingSession>, settings: &ScannerSettings) -> Self {
        Self {
            builder: ReferenceObjectBuilder::new(tracking.clone(), settings.scan.object_creation_interval),
            tracking,
            settings: settings.scan.clone(),
            state: ScanState::Ready,
            object: ScannedObject::new(settings.scan.clone(), settings.snapping.clone(), &settings.gestures),
            point_cloud: PointCloudAggregator::new(settings.scan.point_margin),
            pending: None,
            capture: None,
            merge_candidate: None,
            preview: None,
            warned_low_light: false,
            scan_name: DEFAULT_SCAN_NAME.to_string(),
            camera: FrameCamera::default(),
            planes: Vec::new(),
            pan: ThresholdPan::new(settings.gestures.pan_threshold),
            pan_active: false,
            pinch: ThresholdPinch::new(settings.gestures.pinch_threshold),
            rotation: ThresholdRotation::new(settings.gestures.rotation_threshold),
            events: ScanEventQueue::default(),
        }
    }

    /// Current workflow stage.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Ghost, confirmed volume and origin.
    pub fn scanned_object(&self) -> &ScannedObject {
        &self.object
    }

    /// Reference and live feature points of this scan.
    pub fn point_cloud(&self) -> &PointCloudAggregator {
        &self.point_cloud
    }

    /// Prompt waiting for an answer, if a transition is on hold.
    pub fn pending_prompt(&self) -> Option<&ScanPrompt> {
        self.pending.as_ref().and_then(PendingTransition::current)
    }

    /// The finalized reference object, once one has been built.
    pub fn capture(&self) -> Option<&ReferenceCapture> {
        self.capture.as_ref()
    }

    /// Camera snapshot taken when scanning started.
    pub fn preview_image(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }

    /// Name given to the finalized reference object.
    pub fn scan_name(&self) -> &str {
        &self.scan_name
    }

    pub fn set_scan_name(&mut self, name: impl Into<String>) {
        self.scan_name = name.into();
    }

    /// Queue the capture of an earlier scan to merge into the next finalized one.
    pub fn set_merge_candidate(&mut self, capture: ReferenceCapture) {
        info!(
            "Previous scan '{}' will be merged into this scan",
            capture.name.as_deref().unwrap_or("unnamed")
        );
        self.merge_candidate = Some(capture);
    }

    /// Whether an earlier scan is queued for merging.
    pub fn has_merge_candidate(&self) -> bool {
        self.merge_candidate.is_some()
    }

    /// Too few feature points for a reliable reference object.
    pub fn is_quality_low(&self) -> bool {
        self.point_cloud.count() < self.settings.min_feature_count
    }

    fn is_reasonably_sized(&self) -> bool {
        self.object
            .confirmed()
            .is_some_and(|volume| volume.is_reasonably_sized(&self.settings))
    }

    fn size_prompt(&self) -> ScanPrompt {
        ScanPrompt::UnreasonableSize {
            min_extent: self.settings.min_extent,
            max_extent: self.settings.max_extent,
            min_volume: self.settings.min_volume,
        }
    }

    /// Warnings that have to be confirmed before `target` is entered.
    fn prompts_for(&self, target: ScanState) -> Vec<ScanPrompt> {
        let mut prompts = Vec::new();
        match target {
            ScanState::Scanning => {
                if !self.is_reasonably_sized() {
                    prompts.push(self.size_prompt());
                }
            }
            ScanState::AdjustingOrigin => {
                if !self.is_reasonably_sized() {
                    prompts.push(self.size_prompt());
                }
                if self.is_quality_low() {
                    prompts.push(ScanPrompt::LowQuality {
                        feature_count: self.point_cloud.count(),
                        required: self.settings.min_feature_count,
                    });
                }
                let progress = self.object.confirmed().map_or(0, BoundingBox::progress_percentage);
                if progress < 100 {
                    prompts.push(ScanPrompt::IncompleteCoverage { progress });
                }
            }
            ScanState::Ready | ScanState::DefineBoundingBox => {}
        }
        prompts
    }

    fn check_transition(&self, target: ScanState) -> Result<(), ScanError> {
        if self.pending.is_some() {
            return Err(ScanError::PromptPending);
        }
        if !self.state.can_advance_to(target) {
            return Err(ScanError::IllegalTransition {
                from: self.state,
                to: target,
            });
        }
        match target {
            ScanState::DefineBoundingBox if self.object.either().is_none() => Err(ScanError::GhostBoxMissing),
            ScanState::Scanning | ScanState::AdjustingOrigin if self.object.confirmed().is_none() => {
                Err(ScanError::BoundingBoxMissing)
            }
            _ => Ok(()),
        }
    }

    /// Ask to advance to `target`. Hard precondition failures are returned and
    /// change nothing. Soft ones raise a prompt; the transition is then committed
    /// by [`ScanSession::respond_to_prompt`].
    pub fn request_transition(&mut self, target: ScanState) -> Result<(), ScanError> {
        if let Err(err) = self.check_transition(target) {
            warn!("Rejected transition to {target}: {err}");
            return Err(err);
        }
        let prompts = self.prompts_for(target);
        let Some(first) = prompts.first().copied() else {
            self.commit(target);
            return Ok(());
        };
        info!("Transition to {target} needs confirmation: {}", first.title());
        self.pending = Some(PendingTransition::new(target, prompts));
        self.events.push(ScanEvent::PromptRaised(first));
        Ok(())
    }

    /// Apply the operator's answer to the prompt raised last.
    pub fn respond_to_prompt(&mut self, choice: PromptChoice) -> Result<(), ScanError> {
        let Some(pending) = self.pending.as_mut() else {
            return Err(ScanError::NoPromptPending);
        };
        match pending.respond(choice) {
            PromptResolution::Next(prompt) => self.events.push(ScanEvent::PromptRaised(prompt)),
            PromptResolution::Commit(target) => {
                self.pending = None;
                self.commit(target);
            }
            PromptResolution::Abandon => {
                info!("Staying in {} after prompt", self.state);
                self.pending = None;
            }
        }
        Ok(())
    }

    fn commit(&mut self, target: ScanState) {
        let from = self.state;
        self.state = target;
        match target {
            ScanState::Scanning => {
                self.preview = self.tracking.capture_preview_image();
                if self.preview.is_none() {
                    warn!("No camera frame available for the scan preview");
                }
            }
            ScanState::AdjustingOrigin => {
                self.object.create_origin();
                self.point_cloud.set_hidden(true);
                self.point_cloud.refresh(self.object.either());
                self.push_origin_changed();
            }
            ScanState::Ready | ScanState::DefineBoundingBox => {}
        }
        info!("Scan state changed from {from} to {target}");
        self.events.push(ScanEvent::StateChanged { from, to: target });
    }

    /// Build the final reference object from the confirmed volume and origin,
    /// merging in the queued capture of an earlier scan if there is one.
    pub fn finalize(&mut self) -> Result<(), ScanError> {
        let merge_with = self.merge_candidate.clone();
        self.builder.finalize(
            self.object.confirmed(),
            self.object.origin(),
            &self.scan_name,
            merge_with,
        )?;
        self.merge_candidate = None;
        Ok(())
    }

    /// Extraction or merge of the final reference object is running.
    pub fn is_finalizing(&self) -> bool {
        self.builder.is_finalizing()
    }

    /// Settle a failed merge by keeping one of the two captures.
    pub fn resolve_merge(&mut self, choice: MergeChoice) -> Result<(), ScanError> {
        let capture = self.builder.resolve_merge(choice)?;
        self.capture = Some(capture.clone());
        self.events.push(ScanEvent::ReferenceObjectReady(capture));
        Ok(())
    }

    /// Apply finished background work of the reference object builder.
    pub fn poll_builder(&mut self) {
        for update in self.builder.poll() {
            match update {
                BuilderUpdate::Incremental(capture) => {
                    debug!("Point cloud updated with {} reference points", capture.raw_feature_points.len());
                    self.point_cloud.set_reference_points(capture.raw_feature_points);
                }
                BuilderUpdate::IncrementalFailed(_) => {}
                BuilderUpdate::MergeStarted => self.events.push(ScanEvent::MergeStarted),
                BuilderUpdate::Finalized { capture, merged } => {
                    if merged {
                        self.events.push(ScanEvent::MergeSucceeded);
                    }
                    self.capture = Some(capture.clone());
                    self.events.push(ScanEvent::ReferenceObjectReady(capture));
                }
                BuilderUpdate::FinalizeFailed { error, merge_with } => {
                    // Keep the earlier scan for the next attempt.
                    if self.merge_candidate.is_none() {
                        self.merge_candidate = merge_with;
                    }
                    self.events.push(ScanEvent::ReferenceObjectFailed(error));
                }
                BuilderUpdate::MergeFailed(err) => self.events.push(ScanEvent::MergeFailed(err)),
            }
        }
    }

    pub(super) fn push_volume_changed(&mut self) {
        let Some(volume) = self.object.either() else {
            return;
        };
        let event = ScanEvent::VolumeChanged {
            confirmed: self.object.confirmed().is_some(),
            transform: volume.transform(),
            extent: volume.extent,
        };
        self.events.push(event);
    }

    pub(super) fn push_origin_changed(&mut self) {
        let (Some(origin), Some(volume)) = (self.object.origin(), self.object.confirmed()) else {
            return;
        };
        let event = ScanEvent::OriginChanged {
            transform: origin.world_transform(volume),
            display_scale: origin.display_scale,
        };
        self.events.push(event);
    }

    /// Take all queued events in the order they were raised.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, ScanEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reference::builder::test_support::ScriptedSession;
    use crate::tracking::TrackingFrame;

    pub(crate) fn camera() -> FrameCamera {
        FrameCamera {
            transform: Transform::from_xyz(0.0, 1.0, 1.0).looking_at(Vec3::new(0.0, 0.1, 0.0), Vec3::Y),
            viewport_size: Vec2::new(1000.0, 1000.0),
            vertical_fov: 90f32.to_radians(),
        }
    }

    pub(crate) fn frame(timestamp: f64) -> TrackingFrame {
        TrackingFrame {
            timestamp,
            camera: camera(),
            plane_anchors: vec![PlaneAnchor { center: Vec3::ZERO }],
            ..Default::default()
        }
    }

    pub(crate) fn session() -> (Arc<ScriptedSession>, ScanSession) {
        let tracking = Arc::new(ScriptedSession::default());
        let session = ScanSession::new(tracking.clone(), &ScannerSettings::default());
        (tracking, session)
    }

    /// Session in `defineBoundingBox` with a confirmed volume on the floor.
    pub(crate) fn confirmed_session() -> (Arc<ScriptedSession>, ScanSession) {
        let (tracking, mut session) = session();
        session.process_frame(&frame(0.0));
        session.request_transition(ScanState::DefineBoundingBox).unwrap();
        session.object.confirm_ghost();
        session.drain_events();
        (tracking, session)
    }

    fn state_changes(session: &mut ScanSession) -> Vec<(ScanState, ScanState)> {
        session
            .drain_events()
            .filter_map(|e| match e {
                ScanEvent::StateChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn define_bounding_box_requires_a_ghost() {
        let (_, mut session) = session();
        assert_eq!(
            session.request_transition(ScanState::DefineBoundingBox),
            Err(ScanError::GhostBoxMissing)
        );
        assert_eq!(session.state(), ScanState::Ready);
        assert!(session.drain_events().next().is_none());
    }

    #[test]
    fn scanning_requires_a_confirmed_volume() {
        let (_, mut session) = session();
        session.process_frame(&frame(0.0));
        session.request_transition(ScanState::DefineBoundingBox).unwrap();
        assert_eq!(
            session.request_transition(ScanState::Scanning),
            Err(ScanError::BoundingBoxMissing)
        );
        assert_eq!(session.state(), ScanState::DefineBoundingBox);
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let (_, mut session) = confirmed_session();
        assert_eq!(
            session.request_transition(ScanState::AdjustingOrigin),
            Err(ScanError::IllegalTransition {
                from: ScanState::DefineBoundingBox,
                to: ScanState::AdjustingOrigin
            })
        );
        assert!(state_changes(&mut session).is_empty());
    }

    #[test]
    fn entering_scanning_takes_a_preview_image() {
        let (_, mut session) = confirmed_session();
        session.request_transition(ScanState::Scanning).unwrap();
        assert_eq!(session.state(), ScanState::Scanning);
        assert!(session.preview_image().is_some());
        assert_eq!(
            state_changes(&mut session),
            vec![(ScanState::DefineBoundingBox, ScanState::Scanning)]
        );
    }

    #[test]
    fn unreasonable_size_waits_for_the_operator() {
        let (_, mut session) = confirmed_session();
        if let Some(volume) = session.object.confirmed_mut() {
            volume.extent = Vec3::new(0.05, 0.05, 0.05);
        }
        session.request_transition(ScanState::Scanning).unwrap();
        assert_eq!(session.state(), ScanState::DefineBoundingBox);
        assert!(matches!(session.pending_prompt(), Some(ScanPrompt::UnreasonableSize { .. })));
        assert_eq!(
            session.request_transition(ScanState::Scanning),
            Err(ScanError::PromptPending)
        );

        session.respond_to_prompt(PromptChoice::GoBack).unwrap();
        assert_eq!(session.state(), ScanState::DefineBoundingBox);
        assert!(state_changes(&mut session).is_empty());

        session.request_transition(ScanState::Scanning).unwrap();
        session.respond_to_prompt(PromptChoice::Proceed).unwrap();
        assert_eq!(session.state(), ScanState::Scanning);
        assert_eq!(
            session.respond_to_prompt(PromptChoice::Proceed),
            Err(ScanError::NoPromptPending)
        );
    }

    #[test]
    fn adjusting_origin_warns_about_quality_then_coverage() {
        let (_, mut session) = confirmed_session();
        session.request_transition(ScanState::Scanning).unwrap();
        session.request_transition(ScanState::AdjustingOrigin).unwrap();
        assert!(matches!(session.pending_prompt(), Some(ScanPrompt::LowQuality { feature_count: 0, .. })));
        session.respond_to_prompt(PromptChoice::Proceed).unwrap();
        assert!(matches!(
            session.pending_prompt(),
            Some(ScanPrompt::IncompleteCoverage { progress: 0 })
        ));
        assert_eq!(session.state(), ScanState::Scanning);
        session.respond_to_prompt(PromptChoice::Proceed).unwrap();
        assert_eq!(session.state(), ScanState::AdjustingOrigin);
        assert!(session.scanned_object().origin().is_some());
        assert!(session.point_cloud().is_hidden());
    }

    #[test]
    fn well_scanned_object_enters_adjusting_origin_directly() {
        let (_, mut session) = confirmed_session();
        session.request_transition(ScanState::Scanning).unwrap();
        let points: Vec<Vec3> = (0..120).map(|i| Vec3::new(0.0, -0.05 + i as f32 * 0.0005, 0.0)).collect();
        session.point_cloud.set_reference_points(points);
        session.point_cloud.refresh(session.object.confirmed());
        if let Some(volume) = session.object.confirmed_mut() {
            volume.coverage_mut().capture_all();
        }
        session.request_transition(ScanState::AdjustingOrigin).unwrap();
        assert_eq!(session.state(), ScanState::AdjustingOrigin);
        assert!(session.pending_prompt().is_none());
    }

    #[test]
    fn finalize_names_capture_and_consumes_merge_candidate() {
        let (tracking, mut session) = confirmed_session();
        *tracking.points.lock().unwrap() = vec![Vec3::ZERO];
        assert_eq!(session.finalize(), Err(ScanError::MissingVolumeOrOrigin));

        session.object.create_origin();
        session.set_scan_name("mug");
        session.set_merge_candidate(ReferenceCapture::new(Vec3::ZERO, Vec3::ONE, vec![Vec3::ONE]));
        session.finalize().unwrap();
        assert!(!session.has_merge_candidate());

        for _ in 0..200 {
            session.poll_builder();
            if session.capture().is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let capture = session.capture().unwrap();
        assert_eq!(capture.name.as_deref(), Some("mug"));
        assert_eq!(capture.raw_feature_points.len(), 2);
        let events: Vec<_> = session.drain_events().collect();
        assert!(events.contains(&ScanEvent::MergeStarted));
        assert!(events.contains(&ScanEvent::MergeSucceeded));
    }

    #[test]
    fn failed_merge_is_settled_by_the_operator() {
        let (tracking, mut session) = confirmed_session();
        *tracking.fail_merge.lock().unwrap() = true;
        session.object.create_origin();
        let previous = ReferenceCapture::new(Vec3::ZERO, Vec3::ONE, vec![]).with_name("previous");
        session.set_merge_candidate(previous.clone());
        session.finalize().unwrap();

        let mut failed = false;
        for _ in 0..200 {
            session.poll_builder();
            failed = session
                .drain_events()
                .any(|e| matches!(e, ScanEvent::MergeFailed(_)));
            if failed {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(failed);
        assert!(session.capture().is_none());
        session.resolve_merge(MergeChoice::KeepPrevious).unwrap();
        assert_eq!(session.capture(), Some(&previous));
        assert_eq!(
            session.resolve_merge(MergeChoice::KeepNew),
            Err(ScanError::NoMergeConflict)
        );
    }

    /// Poll the builder until `done` matches a queued event, returning all of them.
    fn poll_events_until(session: &mut ScanSession, done: impl Fn(&ScanEvent) -> bool) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        for _ in 0..200 {
            session.poll_builder();
            events.extend(session.drain_events());
            if events.iter().any(&done) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        events
    }

    #[test]
    fn failed_extraction_keeps_the_merge_candidate_for_a_retry() {
        let (tracking, mut session) = confirmed_session();
        *tracking.fail_extraction.lock().unwrap() = true;
        session.object.create_origin();
        session.set_merge_candidate(ReferenceCapture::new(Vec3::ZERO, Vec3::ONE, vec![Vec3::ONE]));
        session.finalize().unwrap();
        let events = poll_events_until(&mut session, |e| matches!(e, ScanEvent::ReferenceObjectFailed(_)));
        assert!(events.iter().any(|e| matches!(e, ScanEvent::ReferenceObjectFailed(_))));
        assert!(session.has_merge_candidate());

        *tracking.fail_extraction.lock().unwrap() = false;
        session.finalize().unwrap();
        let events = poll_events_until(&mut session, |e| matches!(e, ScanEvent::ReferenceObjectReady(_)));
        assert!(events.contains(&ScanEvent::MergeStarted));
        assert!(events.contains(&ScanEvent::MergeSucceeded));
        assert!(!session.has_merge_candidate());
    }

    #[test]
    fn merge_conflict_survives_another_finalize_request() {
        let (tracking, mut session) = confirmed_session();
        *tracking.fail_merge.lock().unwrap() = true;
        session.object.create_origin();
        let previous = ReferenceCapture::new(Vec3::ZERO, Vec3::ONE, vec![]).with_name("previous");
        session.set_merge_candidate(previous.clone());
        session.finalize().unwrap();
        poll_events_until(&mut session, |e| matches!(e, ScanEvent::MergeFailed(_)));

        assert_eq!(session.finalize(), Err(ScanError::MergeConflictPending));
        assert!(!session.is_finalizing());
        session.resolve_merge(MergeChoice::KeepPrevious).unwrap();
        assert_eq!(session.capture(), Some(&previous));
    }

    #[test]
    fn incremental_builds_feed_the_point_cloud() {
        let (tracking, mut session) = confirmed_session();
        *tracking.points.lock().unwrap() = vec![Vec3::ZERO, Vec3::new(0.05, 0.0, 0.0)];
        session.process_frame(&frame(0.0));
        session.process_frame(&frame(0.8));
        assert!(!session.builder.is_building());

        session.process_frame(&frame(1.5));
        assert!(session.builder.is_building());
        for _ in 0..200 {
            session.process_frame(&frame(1.6));
            if !session.point_cloud().reference_points().is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(session.point_cloud().reference_points().len(), 2);
        assert_eq!(session.point_cloud().count(), 2);
    }
}
