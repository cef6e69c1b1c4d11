use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

impl GesturePhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

/// Raw touch gesture as delivered by the platform, in screen pixels.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum GestureInput {
    OneFingerPan {
        phase: GesturePhase,
        location: Vec2,
    },
    TwoFingerPan {
        phase: GesturePhase,
        /// Centroid of the touches.
        location: Vec2,
        touch_count: u8,
    },
    Pinch {
        phase: GesturePhase,
        touches: [Vec2; 2],
    },
    Rotate {
        phase: GesturePhase,
        /// Cumulative rotation since the gesture began, counter-clockwise positive.
        rotation: f32,
    },
    Tap {
        location: Vec2,
    },
    LongPress {
        phase: GesturePhase,
        location: Vec2,
    },
}
