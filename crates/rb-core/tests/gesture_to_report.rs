//! Integration tests for the rb-core input pipeline.
//!
//! These tests drive raw touch samples through the gesture interpreter and
//! feed the resulting intents to both encoders (HID reports and session
//! envelopes) through the public API only.

use rb_core::{
    decode_mouse_report, encode_intent, intents_for_text, GestureConfig, GestureInterpreter,
    HidKeyCode, HidReport, InputIntent, MouseButton, ReportId, TouchSample,
};

fn all_reports(intents: &[InputIntent]) -> Vec<HidReport> {
    intents.iter().flat_map(encode_intent).collect()
}

// ── Tap ───────────────────────────────────────────────────────────────────────

#[test]
fn test_quick_tap_yields_single_click_and_press_release_reports() {
    // Arrange
    let mut interpreter = GestureInterpreter::default();
    let samples = [
        TouchSample::down(0, 100.0, 100.0, 0),
        TouchSample::moved(0, 105.0, 103.0, 50),
        TouchSample::up(0, 108.0, 106.0, 120),
    ];

    // Act
    let intents: Vec<InputIntent> = interpreter.interpret(samples).collect();
    let reports = all_reports(&intents);

    // Assert
    assert_eq!(
        intents,
        vec![InputIntent::Click {
            button: MouseButton::Left
        }]
    );
    assert_eq!(
        reports,
        vec![
            HidReport::Mouse([0x01, 0, 0, 0]),
            HidReport::Mouse([0x00, 0, 0, 0]),
        ]
    );
}

#[test]
fn test_three_small_moves_within_tap_window_still_click() {
    let mut interpreter = GestureInterpreter::default();
    let intents: Vec<_> = interpreter
        .interpret([
            TouchSample::down(4, 10.0, 10.0, 1000),
            TouchSample::moved(4, 12.0, 11.0, 1030),
            TouchSample::moved(4, 14.0, 12.0, 1060),
            TouchSample::moved(4, 15.0, 13.0, 1090),
            TouchSample::up(4, 15.0, 13.0, 1150),
        ])
        .collect();

    assert_eq!(
        intents,
        vec![InputIntent::Click {
            button: MouseButton::Left
        }]
    );
}

// ── Drag ──────────────────────────────────────────────────────────────────────

#[test]
fn test_long_drag_clamps_each_report_without_wrapping() {
    // Arrange: one huge jump at 4x speed
    let mut interpreter = GestureInterpreter::new(GestureConfig {
        cursor_speed: 4.0,
        ..GestureConfig::default()
    });

    // Act
    let intents: Vec<_> = interpreter
        .interpret([
            TouchSample::down(0, 0.0, 0.0, 0),
            TouchSample::moved(0, 200.0, -90.0, 16),
            TouchSample::up(0, 200.0, -90.0, 400),
        ])
        .collect();
    let reports = all_reports(&intents);

    // Assert
    assert_eq!(intents, vec![InputIntent::Move { dx: 800, dy: -360 }]);
    assert_eq!(decode_mouse_report(&reports[0]), Some((0, 127, -127, 0)));
}

// ── Scroll ────────────────────────────────────────────────────────────────────

#[test]
fn test_two_finger_drag_scrolls_and_hid_wheel_is_negated() {
    // Arrange
    let mut interpreter = GestureInterpreter::default();
    interpreter.on_sample(TouchSample::down(0, 180.0, 300.0, 0));
    interpreter.on_sample(TouchSample::down(1, 220.0, 300.0, 2));

    // Act
    let intents = interpreter.on_frame(&[
        TouchSample::moved(0, 180.0, 280.0, 20),
        TouchSample::moved(1, 220.0, 280.0, 20),
    ]);
    let reports = all_reports(&intents);

    // Assert
    assert_eq!(
        intents,
        vec![InputIntent::Scroll {
            delta_x: 0,
            delta_y: 40
        }]
    );
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].report_id(), ReportId::Mouse);
    assert_eq!(decode_mouse_report(&reports[0]), Some((0, 0, 0, -40)));
}

// ── Typing ────────────────────────────────────────────────────────────────────

#[test]
fn test_typed_text_produces_key_down_up_pairs() {
    let intents: Vec<_> = intents_for_text("A1\n").collect();
    let reports = all_reports(&intents);

    assert_eq!(
        reports,
        vec![
            HidReport::Keyboard([0x02, 0, 0x04, 0, 0, 0, 0, 0]),
            HidReport::Keyboard([0; 8]),
            HidReport::Keyboard([0x00, 0, 0x1E, 0, 0, 0, 0, 0]),
            HidReport::Keyboard([0; 8]),
            HidReport::Keyboard([0x00, 0, 0x28, 0, 0, 0, 0, 0]),
            HidReport::Keyboard([0; 8]),
        ]
    );
    assert!(reports.iter().all(|r| r.report_id() == ReportId::Keyboard));
}

#[test]
fn test_unsupported_characters_emit_no_reports() {
    let intents: Vec<_> = intents_for_text("?!@#").collect();
    assert!(intents.is_empty());
    assert!(all_reports(&intents).is_empty());
}

#[test]
fn test_digit_zero_maps_after_nine() {
    let intents: Vec<_> = intents_for_text("90").collect();
    assert_eq!(
        intents,
        vec![
            InputIntent::KeyPress {
                key: HidKeyCode::Digit9,
                shift: false
            },
            InputIntent::KeyPress {
                key: HidKeyCode::Digit0,
                shift: false
            },
        ]
    );
}
