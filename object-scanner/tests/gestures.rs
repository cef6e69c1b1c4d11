mod common;

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use bevy::prelude::*;
use common::*;
use object_scanner::events::{PromptResponse, ScanEvent, TrackingFrameEvent, TransitionRequest};
use object_scanner::gestures::{GestureInput, GesturePhase};
use object_scanner::scan::{PromptChoice, ScanSession, ScanState};
use object_scanner::{ObjectScannerPlugin, ScannerSettings};

fn confirm_volume(app: &mut App) {
    send(app, TrackingFrameEvent(frame(0.0)));
    send(
        app,
        GestureInput::Tap {
            location: screen_center(),
        },
    );
}

fn enter_adjusting_origin(app: &mut App) {
    confirm_volume(app);
    send(app, TransitionRequest(ScanState::Scanning));
    send(app, TransitionRequest(ScanState::AdjustingOrigin));
    send(app, PromptResponse(PromptChoice::Proceed));
    send(app, PromptResponse(PromptChoice::Proceed));
    assert_eq!(
        app.world().resource::<ScanSession>().state(),
        ScanState::AdjustingOrigin
    );
}

fn rotate(app: &mut App, phase: GesturePhase, rotation: f32) -> Vec<ScanEvent> {
    send(app, GestureInput::Rotate { phase, rotation })
}

fn pinch(app: &mut App, phase: GesturePhase, distance: f32) -> Vec<ScanEvent> {
    send(
        app,
        GestureInput::Pinch {
            phase,
            touches: [Vec2::new(100.0, 500.0), Vec2::new(100.0 + distance, 500.0)],
        },
    )
}

fn extent(app: &App) -> Vec3 {
    app.world()
        .resource::<ScanSession>()
        .scanned_object()
        .confirmed()
        .map(|volume| volume.extent)
        .unwrap_or_default()
}

#[test]
fn origin_rotation_snaps_near_quarter_turns() {
    let mut app = app(Arc::new(FakeTracking::default()));
    enter_adjusting_origin(&mut app);
    let threshold = std::f32::consts::PI / 15.0;
    let yaw = |app: &App| {
        app.world()
            .resource::<ScanSession>()
            .scanned_object()
            .origin()
            .map(|origin| origin.yaw)
            .unwrap_or_default()
    };

    rotate(&mut app, GesturePhase::Began, 0.0);
    let events = rotate(&mut app, GesturePhase::Changed, threshold + 44f32.to_radians());
    assert_abs_diff_eq!(yaw(&app), -44f32.to_radians(), epsilon = 1e-4);
    assert!(!events.contains(&ScanEvent::SnapFeedback));

    let events = rotate(&mut app, GesturePhase::Changed, threshold + 87f32.to_radians());
    assert_abs_diff_eq!(yaw(&app), -FRAC_PI_2, epsilon = 1e-5);
    assert_eq!(
        events.iter().filter(|e| **e == ScanEvent::SnapFeedback).count(),
        1
    );

    // Small follow-up rotation stays snapped without another pulse.
    let events = rotate(&mut app, GesturePhase::Changed, threshold + 89f32.to_radians());
    assert_abs_diff_eq!(yaw(&app), -FRAC_PI_2, epsilon = 1e-5);
    assert!(!events.contains(&ScanEvent::SnapFeedback));
    rotate(&mut app, GesturePhase::Ended, 0.0);
}

#[test]
fn pinch_threshold_comes_from_settings() {
    let settings =
        ScannerSettings::from_json_str(r#"{ "gestures": { "pinch_threshold": 10.0 } }"#).unwrap();
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(
        ObjectScannerPlugin::new(Arc::new(FakeTracking::default())).with_settings(settings),
    );
    confirm_volume(&mut app);
    let before = extent(&app);

    pinch(&mut app, GesturePhase::Began, 100.0);
    let events = pinch(&mut app, GesturePhase::Changed, 120.0);
    let after = extent(&app);
    assert_abs_diff_eq!(after.x, before.x * 120.0 / 110.0, epsilon = 1e-4);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ScanEvent::VolumeChanged { confirmed: true, .. }))
    );
    pinch(&mut app, GesturePhase::Ended, 120.0);
}

#[test]
fn default_pinch_threshold_ignores_small_pinches() {
    let mut app = app(Arc::new(FakeTracking::default()));
    confirm_volume(&mut app);
    let before = extent(&app);
    pinch(&mut app, GesturePhase::Began, 100.0);
    let events = pinch(&mut app, GesturePhase::Changed, 120.0);
    assert_eq!(extent(&app), before);
    assert!(events.is_empty());
}

#[test]
fn one_finger_pan_drags_a_face_of_the_volume() {
    let mut app = app(Arc::new(FakeTracking::default()));
    confirm_volume(&mut app);
    let volume = app
        .world()
        .resource::<ScanSession>()
        .scanned_object()
        .confirmed()
        .cloned()
        .unwrap();
    // Center of the top face, dragged upwards on screen.
    let grab = camera()
        .project(volume.local_to_world(Vec3::new(0.0, volume.extent.y * 0.5, 0.0)))
        .unwrap();
    for (phase, dy) in [
        (GesturePhase::Began, 0.0),
        (GesturePhase::Changed, -40.0),
        (GesturePhase::Ended, -40.0),
    ] {
        send(
            &mut app,
            GestureInput::OneFingerPan {
                phase,
                location: grab + Vec2::new(0.0, dy),
            },
        );
    }
    let after = extent(&app);
    assert!(after.y > volume.extent.y);
    assert_abs_diff_eq!(after.x, volume.extent.x, epsilon = 1e-6);
}
