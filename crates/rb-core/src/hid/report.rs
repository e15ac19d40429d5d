//! Pure encoder from [`InputIntent`]s to HID input reports.
//!
//! Layouts (report ID travels separately, see [`HidReport::report_id`]):
//!
//! ```text
//! Mouse    (ID 1, 4 bytes): [buttons][x:i8][y:i8][wheel:i8]
//! Keyboard (ID 2, 8 bytes): [modifiers][reserved][key0][key1..key5 = 0]
//! ```
//!
//! Axis values are clamped to `-127..=127`; excess magnitude is lost rather
//! than wrapped into the opposite direction.

use crate::domain::intent::InputIntent;

/// Length of the mouse report payload.
pub const MOUSE_REPORT_LEN: usize = 4;

/// Length of the keyboard report payload.
pub const KEYBOARD_REPORT_LEN: usize = 8;

/// Largest magnitude an 8-bit relative axis carries.
const AXIS_LIMIT: i32 = 127;

/// Report IDs declared in [`crate::hid::descriptor::HID_REPORT_DESCRIPTOR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReportId {
    Mouse = 1,
    Keyboard = 2,
}

/// Modifier byte bits (boot keyboard layout).
pub mod modifiers {
    pub const LEFT_CTRL: u8 = 0x01;
    pub const LEFT_SHIFT: u8 = 0x02;
    pub const LEFT_ALT: u8 = 0x04;
    pub const LEFT_GUI: u8 = 0x08;
}

/// One fixed-length input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HidReport {
    Mouse([u8; MOUSE_REPORT_LEN]),
    Keyboard([u8; KEYBOARD_REPORT_LEN]),
}

impl HidReport {
    /// Mouse report with every button released and every axis at rest.
    pub const MOUSE_IDLE: HidReport = HidReport::Mouse([0; MOUSE_REPORT_LEN]);

    /// Keyboard report with no key or modifier held.
    pub const KEYBOARD_RELEASED: HidReport = HidReport::Keyboard([0; KEYBOARD_REPORT_LEN]);

    pub fn report_id(&self) -> ReportId {
        match self {
            HidReport::Mouse(_) => ReportId::Mouse,
            HidReport::Keyboard(_) => ReportId::Keyboard,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HidReport::Mouse(bytes) => &bytes[..],
            HidReport::Keyboard(bytes) => &bytes[..],
        }
    }
}

/// Encodes one intent as the report sequence the host must receive in order.
///
/// `Move` and `Scroll` yield one report; `Click` and `KeyPress` yield a
/// press followed by a release.
pub fn encode_intent(intent: &InputIntent) -> Vec<HidReport> {
    match *intent {
        InputIntent::Move { dx, dy } => {
            vec![mouse_report(0, dx, dy, 0)]
        }
        InputIntent::Click { button } => {
            vec![mouse_report(button.hid_bit(), 0, 0, 0), HidReport::MOUSE_IDLE]
        }
        InputIntent::Scroll { delta_y, .. } => {
            // The descriptor has no horizontal wheel; delta_x is dropped.
            vec![mouse_report(0, 0, 0, -delta_y)]
        }
        InputIntent::KeyPress { key, shift } => {
            let modifier = if shift { modifiers::LEFT_SHIFT } else { 0 };
            let mut down = [0u8; KEYBOARD_REPORT_LEN];
            down[0] = modifier;
            down[2] = key.as_u8();
            vec![HidReport::Keyboard(down), HidReport::KEYBOARD_RELEASED]
        }
    }
}

/// Decodes a mouse report into `(buttons, dx, dy, wheel)`.
///
/// Returns `None` for keyboard reports.
pub fn decode_mouse_report(report: &HidReport) -> Option<(u8, i8, i8, i8)> {
    match report {
        HidReport::Mouse([buttons, x, y, wheel]) => {
            Some((*buttons, *x as i8, *y as i8, *wheel as i8))
        }
        HidReport::Keyboard(_) => None,
    }
}

fn mouse_report(buttons: u8, x: i32, y: i32, wheel: i32) -> HidReport {
    HidReport::Mouse([buttons, clamp_axis(x), clamp_axis(y), clamp_axis(wheel)])
}

fn clamp_axis(value: i32) -> u8 {
    value.clamp(-AXIS_LIMIT, AXIS_LIMIT) as i8 as u8
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intent::MouseButton;
    use crate::keymap::hid::HidKeyCode;

    #[test]
    fn test_move_encodes_signed_axes() {
        let reports = encode_intent(&InputIntent::Move { dx: -5, dy: 12 });
        assert_eq!(reports, vec![HidReport::Mouse([0x00, 0xFB, 0x0C, 0x00])]);
    }

    #[test]
    fn test_move_round_trips_within_axis_range() {
        for (dx, dy) in [(0, 0), (127, -127), (-127, 127), (1, -1), (-64, 99)] {
            let reports = encode_intent(&InputIntent::Move { dx, dy });
            let (buttons, x, y, wheel) = decode_mouse_report(&reports[0]).unwrap();
            assert_eq!((buttons, x as i32, y as i32, wheel), (0, dx, dy, 0));
        }
    }

    #[test]
    fn test_move_clamps_instead_of_wrapping() {
        // Arrange
        let intent = InputIntent::Move { dx: 300, dy: -1000 };

        // Act
        let reports = encode_intent(&intent);

        // Assert
        let (_, x, y, _) = decode_mouse_report(&reports[0]).unwrap();
        assert_eq!(x, 127);
        assert_eq!(y, -127, "-128 is never produced");
    }

    #[test]
    fn test_click_is_press_then_release_differing_only_in_buttons() {
        let reports = encode_intent(&InputIntent::Click {
            button: MouseButton::Left,
        });

        assert_eq!(
            reports,
            vec![
                HidReport::Mouse([0x01, 0, 0, 0]),
                HidReport::Mouse([0x00, 0, 0, 0]),
            ]
        );
    }

    #[test]
    fn test_right_and_middle_click_use_their_bits() {
        let right = encode_intent(&InputIntent::Click {
            button: MouseButton::Right,
        });
        let middle = encode_intent(&InputIntent::Click {
            button: MouseButton::Middle,
        });
        assert_eq!(right[0].as_bytes()[0], 0x02);
        assert_eq!(middle[0].as_bytes()[0], 0x04);
    }

    #[test]
    fn test_scroll_negates_and_clamps_wheel() {
        let up = encode_intent(&InputIntent::Scroll {
            delta_x: 0,
            delta_y: 40,
        });
        let huge = encode_intent(&InputIntent::Scroll {
            delta_x: 9,
            delta_y: -500,
        });

        assert_eq!(decode_mouse_report(&up[0]), Some((0, 0, 0, -40)));
        assert_eq!(decode_mouse_report(&huge[0]), Some((0, 0, 0, 127)));
    }

    #[test]
    fn test_uppercase_key_sets_left_shift() {
        let reports = encode_intent(&InputIntent::KeyPress {
            key: HidKeyCode::KeyA,
            shift: true,
        });

        assert_eq!(
            reports,
            vec![
                HidReport::Keyboard([0x02, 0, 0x04, 0, 0, 0, 0, 0]),
                HidReport::Keyboard([0; 8]),
            ]
        );
    }

    #[test]
    fn test_plain_key_has_no_modifier() {
        let reports = encode_intent(&InputIntent::KeyPress {
            key: HidKeyCode::Enter,
            shift: false,
        });
        assert_eq!(reports[0], HidReport::Keyboard([0x00, 0x00, 0x28, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_report_ids_and_lengths() {
        assert_eq!(HidReport::MOUSE_IDLE.report_id() as u8, 1);
        assert_eq!(HidReport::KEYBOARD_RELEASED.report_id() as u8, 2);
        assert_eq!(HidReport::MOUSE_IDLE.as_bytes().len(), 4);
        assert_eq!(HidReport::KEYBOARD_RELEASED.as_bytes().len(), 8);
    }

    #[test]
    fn test_decode_rejects_keyboard_report() {
        assert_eq!(decode_mouse_report(&HidReport::KEYBOARD_RELEASED), None);
    }

    #[test]
    fn test_encoder_is_deterministic() {
        let intent = InputIntent::Move { dx: 7, dy: -3 };
        assert_eq!(encode_intent(&intent), encode_intent(&intent));
    }
}
