use bevy::prelude::*;

use super::session::ScanSession;
use super::state::ScanState;
use crate::events::{Advisory, ScanEvent};
use crate::tracking::TrackingFrame;

impl ScanSession {
    /// Advance the workflow by one tracking frame.
    ///
    /// Finished background work is applied first, so a build requested in this
    /// frame is never collected by the same call.
    pub fn process_frame(&mut self, frame: &TrackingFrame) {
        self.camera = frame.camera;
        self.planes.clone_from(&frame.plane_anchors);
        self.poll_builder();

        let points = frame.raw_feature_points.as_deref().unwrap_or_default();

        if matches!(self.state, ScanState::Ready | ScanState::DefineBoundingBox)
            && self.object.update_ghost(points, &self.camera, &self.planes)
        {
            self.push_volume_changed();
        }

        if self.state != ScanState::AdjustingOrigin {
            self.check_low_light(frame.ambient_intensity);

            if let Some(volume) = self.object.confirmed() {
                if !self.builder.is_finalizing() {
                    self.builder.request_incremental_build(frame.timestamp, volume);
                }
            }
            self.point_cloud.update_live_points(frame.raw_feature_points.as_deref());
        }

        if self.state == ScanState::Scanning {
            if let Some(progress) = self
                .object
                .confirmed_mut()
                .and_then(|volume| volume.update_coverage(&frame.camera))
            {
                debug!("Capture progress {progress}%");
                self.events.push(ScanEvent::ProgressChanged(progress));
            }
        }

        self.point_cloud.refresh(self.object.either());
    }

    /// Raise the low light advisory once, and only for a first scan.
    fn check_low_light(&mut self, ambient_intensity: Option<f32>) {
        if self.warned_low_light || self.has_merge_candidate() {
            return;
        }
        let Some(intensity) = ambient_intensity else {
            return;
        };
        if intensity < self.settings.low_light_intensity {
            self.warned_low_light = true;
            warn!("Ambient intensity {intensity:.0} is too low for scanning");
            self.events.push(ScanEvent::Advisory(Advisory::LowLight));
        }
    }
}
