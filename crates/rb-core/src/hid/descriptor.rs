//! HID report descriptor registered with the Bluetooth HID device profile.
//!
//! The descriptor declares two top-level application collections, each
//! tagged with its own report ID so the host can tell them apart:
//!
//! | Report ID | Collection | Payload layout (after the ID byte)                       |
//! |-----------|------------|----------------------------------------------------------|
//! | 1         | Mouse      | buttons(3 bits + 5 pad) · X · Y · wheel (signed 8-bit)   |
//! | 2         | Keyboard   | modifiers · reserved · 6 × keycode                       |
//!
//! Every report produced by [`crate::hid::report::encode_intent`] conforms to
//! this layout.

use crate::hid::report::ReportId;

/// Combined mouse + boot-keyboard report descriptor.
#[rustfmt::skip]
pub const HID_REPORT_DESCRIPTOR: &[u8] = &[
    // ── Mouse ──────────────────────────────────────────────────────────────
    0x05, 0x01,                     // Usage Page (Generic Desktop)
    0x09, 0x02,                     // Usage (Mouse)
    0xA1, 0x01,                     // Collection (Application)
    0x85, ReportId::Mouse as u8,    //   Report ID (1)
    0x09, 0x01,                     //   Usage (Pointer)
    0xA1, 0x00,                     //   Collection (Physical)
    0x05, 0x09,                     //     Usage Page (Button)
    0x19, 0x01,                     //     Usage Minimum (1)
    0x29, 0x03,                     //     Usage Maximum (3)
    0x15, 0x00,                     //     Logical Minimum (0)
    0x25, 0x01,                     //     Logical Maximum (1)
    0x95, 0x03,                     //     Report Count (3)
    0x75, 0x01,                     //     Report Size (1)
    0x81, 0x02,                     //     Input (Data, Var, Abs)
    0x95, 0x01,                     //     Report Count (1)
    0x75, 0x05,                     //     Report Size (5)
    0x81, 0x01,                     //     Input (Const) padding
    0x05, 0x01,                     //     Usage Page (Generic Desktop)
    0x09, 0x30,                     //     Usage (X)
    0x09, 0x31,                     //     Usage (Y)
    0x09, 0x38,                     //     Usage (Wheel)
    0x15, 0x81,                     //     Logical Minimum (-127)
    0x25, 0x7F,                     //     Logical Maximum (127)
    0x75, 0x08,                     //     Report Size (8)
    0x95, 0x03,                     //     Report Count (3)
    0x81, 0x06,                     //     Input (Data, Var, Rel)
    0xC0,                           //   End Collection
    0xC0,                           // End Collection
    // ── Keyboard ───────────────────────────────────────────────────────────
    0x05, 0x01,                     // Usage Page (Generic Desktop)
    0x09, 0x06,                     // Usage (Keyboard)
    0xA1, 0x01,                     // Collection (Application)
    0x85, ReportId::Keyboard as u8, //   Report ID (2)
    0x05, 0x07,                     //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0,                     //   Usage Minimum (Left Control)
    0x29, 0xE7,                     //   Usage Maximum (Right GUI)
    0x15, 0x00,                     //   Logical Minimum (0)
    0x25, 0x01,                     //   Logical Maximum (1)
    0x75, 0x01,                     //   Report Size (1)
    0x95, 0x08,                     //   Report Count (8)
    0x81, 0x02,                     //   Input (Data, Var, Abs) modifiers
    0x95, 0x01,                     //   Report Count (1)
    0x75, 0x08,                     //   Report Size (8)
    0x81, 0x01,                     //   Input (Const) reserved
    0x95, 0x06,                     //   Report Count (6)
    0x75, 0x08,                     //   Report Size (8)
    0x15, 0x00,                     //   Logical Minimum (0)
    0x25, 0x65,                     //   Logical Maximum (101)
    0x05, 0x07,                     //   Usage Page (Keyboard/Keypad)
    0x19, 0x00,                     //   Usage Minimum (0)
    0x29, 0x65,                     //   Usage Maximum (101)
    0x81, 0x00,                     //   Input (Data, Array) keycodes
    0xC0,                           // End Collection
];
