use std::time::Duration;

use bevy::prelude::*;

use crate::events::{Advisory, ScanEvent, ScanEventQueue};
use crate::settings::DetectionSettings;
use crate::tracking::TrackingState;

/// Short status line shown over the camera view.
///
/// A message carries a single-shot expiration timer that is replaced whenever a
/// new message is displayed. Tracking state changes produce their own messages;
/// when tracking recovers, a message that has not expired yet keeps its remaining
/// time instead of being cleared.
#[derive(Resource)]
pub struct SessionInfo {
    settings: DetectionSettings,
    message: Option<String>,
    expiration: Option<Timer>,
    last_tracking_state: Option<TrackingState>,
    events: ScanEventQueue,
}

impl SessionInfo {
    pub fn new(settings: DetectionSettings) -> Self {
        Self {
            settings,
            message: None,
            expiration: None,
            last_tracking_state: None,
            events: ScanEventQueue::default(),
        }
    }

    /// Message currently shown, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Show `text` for `seconds`.
    pub fn display_message(&mut self, text: impl Into<String>, seconds: f32) {
        let text = text.into();
        debug!("Session info: {text}");
        self.expiration = Some(Timer::from_seconds(seconds, TimerMode::Once));
        self.message = Some(text.clone());
        self.events.push(ScanEvent::InfoMessage(Some(text)));
    }

    /// Show an advisory as `title: message`.
    pub fn display_advisory(&mut self, advisory: Advisory) {
        let seconds = self.settings.advisory_message_duration;
        self.display_message(
            format!("{}: {}", advisory.title(), advisory.message()),
            seconds,
        );
    }

    /// Hide the message and cancel its expiration.
    pub fn clear(&mut self) {
        self.expiration = None;
        if self.message.take().is_some() {
            self.events.push(ScanEvent::InfoMessage(None));
        }
    }

    /// React to the tracking quality of the latest frame. `testing` selects the
    /// wording used during a test run.
    pub fn update_for_tracking_state(&mut self, state: TrackingState, testing: bool) {
        if self.last_tracking_state == Some(state) {
            return;
        }
        self.last_tracking_state = Some(state);
        let activity = if testing { "Detecting" } else { "Scanning" };
        let seconds = self.settings.tracking_message_duration;
        match state {
            TrackingState::NotAvailable => self.display_message(
                format!("{activity} not possible: {}", state.presentation_string()),
                seconds,
            ),
            TrackingState::Limited(_) => self.display_message(
                format!("{activity} might not work: {}", state.presentation_string()),
                seconds,
            ),
            TrackingState::Normal => {
                let running = self.expiration.as_ref().is_some_and(|t| !t.finished());
                if !running {
                    self.clear();
                }
            }
        }
    }

    /// Advance the expiration timer, clearing the message when it runs out.
    pub fn tick(&mut self, delta: Duration) {
        let Some(timer) = self.expiration.as_mut() else {
            return;
        };
        timer.tick(delta);
        if timer.just_finished() {
            self.clear();
        }
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, ScanEvent> {
        self.events.drain()
    }
}
