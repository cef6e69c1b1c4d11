use bevy::prelude::*;

use super::session::ScanSession;
use super::state::ScanState;
use crate::events::ScanEvent;
use crate::gestures::{GestureInput, GesturePhase};
use crate::manipulation::{ManipulationUpdate, OriginTap, VolumeTap};

impl ScanSession {
    /// Route a touch gesture to the volume or the origin, depending on the stage.
    ///
    /// Any gesture in `ready` first tries to move on to `defineBoundingBox`.
    /// Gestures in a stage without a manipulable object are dropped.
    pub fn handle_gesture(&mut self, gesture: &GestureInput) {
        if self.state == ScanState::Ready && self.request_transition(ScanState::DefineBoundingBox).is_err() {
            return;
        }
        if self.state.manipulates_volume() {
            self.handle_volume_gesture(gesture);
        } else if self.state == ScanState::AdjustingOrigin {
            self.handle_origin_gesture(gesture);
        }
    }

    fn handle_volume_gesture(&mut self, gesture: &GestureInput) {
        let camera = self.camera;
        let update = match *gesture {
            GestureInput::OneFingerPan { phase, location } => self.face_drag(phase, location, false),
            GestureInput::LongPress { phase, location } => self.face_drag(phase, location, true),
            GestureInput::TwoFingerPan {
                phase,
                location,
                touch_count,
            } => match phase {
                GesturePhase::Began => {
                    self.begin_pan(location, touch_count);
                    if self.pan_active {
                        self.object.start_ground_drag(self.pan.offset_location(), &camera);
                    }
                    ManipulationUpdate::default()
                }
                GesturePhase::Changed => {
                    if self.update_pan(location) {
                        let screen = self.pan.offset_location();
                        self.object.update_ground_drag(screen, &camera, &self.planes)
                    } else {
                        ManipulationUpdate::default()
                    }
                }
                GesturePhase::Ended | GesturePhase::Cancelled => {
                    self.end_pan();
                    self.object.end_volume_drags();
                    ManipulationUpdate::default()
                }
            },
            GestureInput::Rotate { phase, rotation } => {
                let delta = self.filter_rotation(phase, rotation);
                self.object.rotate_volume(-delta, &self.planes)
            }
            GestureInput::Pinch { phase, touches } => {
                let scale = self.filter_pinch(phase, touches);
                if scale == 1.0 {
                    ManipulationUpdate::default()
                } else {
                    self.object.scale_volume(scale, &self.planes)
                }
            }
            GestureInput::Tap { location } => match self.object.tap_volume(location, &camera, &self.planes) {
                VolumeTap::Confirmed => {
                    info!("Bounding box confirmed");
                    ManipulationUpdate {
                        changed: true,
                        pulse: false,
                    }
                }
                VolumeTap::Moved => ManipulationUpdate {
                    changed: true,
                    pulse: false,
                },
                VolumeTap::Ignored => ManipulationUpdate::default(),
            },
        };
        if update.changed {
            // Results of builds requested for the old pose no longer apply.
            if self.object.confirmed().is_some() {
                self.builder.invalidate();
            }
            self.push_volume_changed();
        }
        if update.pulse {
            self.events.push(ScanEvent::SnapFeedback);
        }
    }

    fn face_drag(&mut self, phase: GesturePhase, location: Vec2, symmetric: bool) -> ManipulationUpdate {
        let camera = self.camera;
        match phase {
            GesturePhase::Began => {
                self.object.start_face_drag(location, &camera, symmetric);
                ManipulationUpdate::default()
            }
            GesturePhase::Changed => self.object.update_face_drag(location, &camera, &self.planes),
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.object.end_volume_drags();
                ManipulationUpdate::default()
            }
        }
    }

    fn handle_origin_gesture(&mut self, gesture: &GestureInput) {
        let camera = self.camera;
        let update = match *gesture {
            GestureInput::OneFingerPan { phase, location } | GestureInput::LongPress { phase, location } => {
                match phase {
                    GesturePhase::Began => {
                        self.object.start_origin_axis_drag(location);
                        ManipulationUpdate::default()
                    }
                    GesturePhase::Changed => self.object.update_origin_axis_drag(location, &camera),
                    GesturePhase::Ended | GesturePhase::Cancelled => {
                        self.object.end_origin_drags();
                        ManipulationUpdate::default()
                    }
                }
            }
            GestureInput::TwoFingerPan {
                phase,
                location,
                touch_count,
            } => match phase {
                GesturePhase::Began => {
                    self.begin_pan(location, touch_count);
                    if self.pan_active {
                        self.object.start_origin_plane_drag(self.pan.offset_location(), &camera);
                    }
                    ManipulationUpdate::default()
                }
                GesturePhase::Changed => {
                    if self.update_pan(location) {
                        let screen = self.pan.offset_location();
                        self.object.update_origin_plane_drag(screen, &camera)
                    } else {
                        ManipulationUpdate::default()
                    }
                }
                GesturePhase::Ended | GesturePhase::Cancelled => {
                    self.end_pan();
                    self.object.end_origin_drags();
                    ManipulationUpdate::default()
                }
            },
            GestureInput::Rotate { phase, rotation } => {
                let delta = self.filter_rotation(phase, rotation);
                self.object.rotate_origin(-delta)
            }
            GestureInput::Pinch { phase, touches } => {
                let scale = self.filter_pinch(phase, touches);
                ManipulationUpdate {
                    changed: scale != 1.0 && self.object.scale_origin(scale),
                    pulse: false,
                }
            }
            GestureInput::Tap { location } => match self.object.tap_origin(location, &camera) {
                OriginTap::Flashed => {
                    self.events.push(ScanEvent::OriginFlashed);
                    ManipulationUpdate::default()
                }
                OriginTap::Repositioned => ManipulationUpdate {
                    changed: true,
                    pulse: false,
                },
                OriginTap::Missed => ManipulationUpdate::default(),
            },
        };
        if update.changed {
            self.push_origin_changed();
        }
        if update.pulse {
            self.events.push(ScanEvent::SnapFeedback);
        }
    }

    fn begin_pan(&mut self, location: Vec2, touch_count: u8) {
        self.pan_active = touch_count == 2;
        if self.pan_active {
            let object = self.object.object_on_screen(&self.camera);
            self.pan.begin(location, object);
        }
    }

    /// Feed the pan filter, true once it moved past its dead zone.
    fn update_pan(&mut self, location: Vec2) -> bool {
        if !self.pan_active {
            return false;
        }
        self.pan.update(location);
        self.pan.is_threshold_exceeded()
    }

    fn end_pan(&mut self) {
        self.pan_active = false;
        self.pan.end();
    }

    fn filter_rotation(&mut self, phase: GesturePhase, rotation: f32) -> f32 {
        match phase {
            GesturePhase::Began => {
                self.rotation.begin();
                0.0
            }
            GesturePhase::Changed => self.rotation.update(rotation),
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.rotation.end();
                0.0
            }
        }
    }

    fn filter_pinch(&mut self, phase: GesturePhase, touches: [Vec2; 2]) -> f32 {
        match phase {
            GesturePhase::Began => {
                self.pinch.begin(touches);
                1.0
            }
            GesturePhase::Changed => self.pinch.update(touches),
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.pinch.end();
                1.0
            }
        }
    }
}
