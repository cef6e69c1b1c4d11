use bevy::prelude::*;

use super::input::GesturePhase;

/// Two-finger pan that ignores movement until it leaves a dead zone.
///
/// The reported location is the start location plus whatever the touch moved
/// beyond the dead zone boundary, so an object dragged with it never jumps when
/// the threshold is crossed.
#[derive(Debug, Clone)]
pub struct ThresholdPan {
    threshold: f32,
    exceeded: bool,
    initial_location: Vec2,
    baseline: Vec2,
    current: Vec2,
    offset_to_object: Vec2,
}

impl ThresholdPan {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            exceeded: false,
            initial_location: Vec2::ZERO,
            baseline: Vec2::ZERO,
            current: Vec2::ZERO,
            offset_to_object: Vec2::ZERO,
        }
    }

    /// Start tracking; `object_on_screen` is the projected position of the object
    /// being dragged, if it is visible.
    pub fn begin(&mut self, location: Vec2, object_on_screen: Option<Vec2>) {
        self.exceeded = false;
        self.initial_location = location;
        self.baseline = location;
        self.current = location;
        self.offset_to_object = object_on_screen
            .map(|object| object - location)
            .unwrap_or(Vec2::ZERO);
    }

    /// Feed a new touch location, returns the translation since the threshold
    /// boundary (zero while still inside the dead zone).
    pub fn update(&mut self, location: Vec2) -> Vec2 {
        self.current = location;
        if !self.exceeded {
            let moved = location - self.initial_location;
            if moved.length() <= self.threshold {
                return Vec2::ZERO;
            }
            self.exceeded = true;
            self.baseline = self.initial_location + moved.normalize() * self.threshold;
        }
        self.translation()
    }

    /// Reset for the next gesture.
    pub fn end(&mut self) {
        self.exceeded = false;
        self.initial_location = Vec2::ZERO;
        self.baseline = Vec2::ZERO;
        self.current = Vec2::ZERO;
        self.offset_to_object = Vec2::ZERO;
    }

    pub fn handle(&mut self, phase: GesturePhase, location: Vec2, object_on_screen: Option<Vec2>) {
        match phase {
            GesturePhase::Began => self.begin(location, object_on_screen),
            GesturePhase::Changed => {
                self.update(location);
            }
            GesturePhase::Ended | GesturePhase::Cancelled => self.end(),
        }
    }

    pub fn is_threshold_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn translation(&self) -> Vec2 {
        if self.exceeded {
            self.current - self.baseline
        } else {
            Vec2::ZERO
        }
    }

    /// Corrected touch location: start point plus post-threshold translation.
    pub fn location(&self) -> Vec2 {
        self.initial_location + self.translation()
    }

    /// Location of the dragged object's anchor point under the corrected touch.
    pub fn offset_location(&self) -> Vec2 {
        self.location() + self.offset_to_object
    }
}

/// Pinch that reports identity scale until the finger separation changed enough.
#[derive(Debug, Clone)]
pub struct ThresholdPinch {
    threshold: f32,
    exceeded: bool,
    initial_distance: f32,
    last_distance: f32,
}

impl ThresholdPinch {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            exceeded: false,
            initial_distance: 0.0,
            last_distance: 0.0,
        }
    }

    pub fn begin(&mut self, touches: [Vec2; 2]) {
        self.exceeded = false;
        self.initial_distance = touches[0].distance(touches[1]);
        self.last_distance = self.initial_distance;
    }

    /// Incremental scale factor since the previous update.
    pub fn update(&mut self, touches: [Vec2; 2]) -> f32 {
        let distance = touches[0].distance(touches[1]);
        if !self.exceeded {
            let change = distance - self.initial_distance;
            if change.abs() <= self.threshold {
                return 1.0;
            }
            self.exceeded = true;
            self.last_distance = self.initial_distance + change.signum() * self.threshold;
        }
        if self.last_distance <= f32::EPSILON {
            self.last_distance = distance;
            return 1.0;
        }
        let scale = distance / self.last_distance;
        self.last_distance = distance;
        scale
    }

    /// Reset for the next gesture.
    pub fn end(&mut self) {
        self.exceeded = false;
        self.initial_distance = 0.0;
        self.last_distance = 0.0;
    }

    pub fn is_threshold_exceeded(&self) -> bool {
        self.exceeded
    }
}

/// Rotation gesture reporting per-update deltas once past its dead zone.
#[derive(Debug, Clone)]
pub struct ThresholdRotation {
    threshold: f32,
    exceeded: bool,
    previous_rotation: f32,
}

impl ThresholdRotation {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            exceeded: false,
            previous_rotation: 0.0,
        }
    }

    pub fn begin(&mut self) {
        self.exceeded = false;
        self.previous_rotation = 0.0;
    }

    /// `rotation` is the cumulative gesture rotation since it began.
    pub fn update(&mut self, rotation: f32) -> f32 {
        if !self.exceeded {
            if rotation.abs() <= self.threshold {
                return 0.0;
            }
            self.exceeded = true;
            self.previous_rotation = rotation.signum() * self.threshold;
        }
        let delta = rotation - self.previous_rotation;
        self.previous_rotation = rotation;
        delta
    }

    /// Reset for the next gesture.
    pub fn end(&mut self) {
        self.begin();
    }

    pub fn is_threshold_exceeded(&self) -> bool {
        self.exceeded
    }
}
