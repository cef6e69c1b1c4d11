use bevy::prelude::*;

use crate::detection::DetectionMarker;
use crate::reference::MergeChoice;
use crate::scan::{PromptChoice, ScanPrompt, ScanState};
use crate::tracking::{AnchorId, ReferenceCapture, TrackingError, TrackingFrame};

/// One-off notices for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    LowLight,
    NoDetection,
}

impl Advisory {
    pub fn title(&self) -> &'static str {
        match self {
            Self::LowLight => "Too dark for scanning",
            Self::NoDetection => "Object not detected",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::LowLight => "Consider moving to an environment with more light.",
            Self::NoDetection => {
                "Unable to detect the object. Please point the device at the scanned object, \
                 rescan or add another scan of this object in the current environment."
            }
        }
    }
}

/// Everything the scanner reports to the rendering and UI collaborators.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ScanEvent {
    StateChanged {
        from: ScanState,
        to: ScanState,
    },
    VolumeChanged {
        confirmed: bool,
        transform: Transform,
        extent: Vec3,
    },
    /// World pose of the origin and its gizmo scale.
    OriginChanged {
        transform: Transform,
        display_scale: f32,
    },
    OriginFlashed,
    /// A snap engaged; one pulse per engagement.
    SnapFeedback,
    PromptRaised(ScanPrompt),
    Advisory(Advisory),
    ProgressChanged(u32),
    ReferenceObjectReady(ReferenceCapture),
    ReferenceObjectFailed(TrackingError),
    MergeStarted,
    MergeSucceeded,
    /// Both captures are kept until a [`MergeResolution`] picks one.
    MergeFailed(TrackingError),
    TestRunStarted,
    DetectionUpdated {
        marker: DetectionMarker,
        statistics: String,
    },
    InfoMessage(Option<String>),
}

/// Outgoing events collected by the components between two flushes.
#[derive(Debug, Default)]
pub struct ScanEventQueue {
    pending: Vec<ScanEvent>,
}

impl ScanEventQueue {
    pub fn push(&mut self, event: ScanEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, ScanEvent> {
        self.pending.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> &[ScanEvent] {
        &self.pending
    }
}

/// New frame from the tracking collaborator.
#[derive(Event, Debug, Clone)]
pub struct TrackingFrameEvent(pub TrackingFrame);

/// Ask the workflow to advance to the given state.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest(pub ScanState);

/// Operator decision on the prompt raised last.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptResponse(pub PromptChoice);

/// Operator decision after a failed merge.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeResolution(pub MergeChoice);

/// Build the final reference object from the confirmed volume and origin.
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeScanRequest;

/// Capture of an earlier scan to merge into the next finalized one.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct MergeCandidate(pub ReferenceCapture);

/// Start testing detection of the finalized reference object.
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartTestRun;

/// Leave the test run and switch the collaborator back to scanning.
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopTestRun;

/// The collaborator detected the reference object under test.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ObjectDetected {
    pub anchor: AnchorId,
    pub transform: Transform,
}
