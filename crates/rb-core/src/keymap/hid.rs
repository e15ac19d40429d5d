//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! The device only types the boot-keyboard subset it can express through a
//! single keycode slot: letters, digits, space and Enter.  Every other
//! character is silently skipped by [`KeyStroke::from_char`].
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # What is a HID Usage ID? (for beginners)
//!
//! The **USB Human Interface Device (HID)** standard assigns a unique number to
//! every key on a keyboard.  These numbers are called *Usage IDs* and they are
//! grouped by *Usage Page*.  All keyboard keys are on page 0x07.
//!
//! | Key          | HID Usage ID |
//! |--------------|-------------|
//! | Letter A     | 0x04        |
//! | Digit 1      | 0x1E        |
//! | Digit 0      | 0x27        |
//! | Enter        | 0x28        |
//! | Space        | 0x2C        |
//!
//! HID codes represent **physical key positions**, not characters.  An
//! uppercase `'A'` is the same key as `'a'` with the Shift modifier held, which
//! is why [`KeyStroke`] carries the key and the shift flag separately.

use serde::{Deserialize, Serialize};

/// First usage ID of the contiguous letter range (`a`).
const LETTER_BASE: u8 = 0x04;

/// First usage ID of the contiguous digit range (`1`).
const DIGIT_BASE: u8 = 0x1E;

/// USB HID Usage ID for the keys the device can type (page 0x07).
///
/// The numeric value of each variant is its HID Usage ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27); note that 0 comes after 9
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Whitespace
    Enter = 0x28,
    Space = 0x2C,
}

/// Letters in usage-ID order, indexed by `c - 'a'`.
const LETTERS: [HidKeyCode; 26] = [
    HidKeyCode::KeyA, HidKeyCode::KeyB, HidKeyCode::KeyC, HidKeyCode::KeyD,
    HidKeyCode::KeyE, HidKeyCode::KeyF, HidKeyCode::KeyG, HidKeyCode::KeyH,
    HidKeyCode::KeyI, HidKeyCode::KeyJ, HidKeyCode::KeyK, HidKeyCode::KeyL,
    HidKeyCode::KeyM, HidKeyCode::KeyN, HidKeyCode::KeyO, HidKeyCode::KeyP,
    HidKeyCode::KeyQ, HidKeyCode::KeyR, HidKeyCode::KeyS, HidKeyCode::KeyT,
    HidKeyCode::KeyU, HidKeyCode::KeyV, HidKeyCode::KeyW, HidKeyCode::KeyX,
    HidKeyCode::KeyY, HidKeyCode::KeyZ,
];

/// Digits 1–9 in usage-ID order, indexed by `c - '1'`.
const DIGITS: [HidKeyCode; 9] = [
    HidKeyCode::Digit1, HidKeyCode::Digit2, HidKeyCode::Digit3,
    HidKeyCode::Digit4, HidKeyCode::Digit5, HidKeyCode::Digit6,
    HidKeyCode::Digit7, HidKeyCode::Digit8, HidKeyCode::Digit9,
];

impl HidKeyCode {
    /// Returns the raw HID usage ID.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a raw usage ID back into a key, or `None` for IDs outside the
    /// supported subset.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            LETTER_BASE..=0x1D => Some(LETTERS[(value - LETTER_BASE) as usize]),
            DIGIT_BASE..=0x26 => Some(DIGITS[(value - DIGIT_BASE) as usize]),
            0x27 => Some(HidKeyCode::Digit0),
            0x28 => Some(HidKeyCode::Enter),
            0x2C => Some(HidKeyCode::Space),
            _ => None,
        }
    }

    /// Key name understood by the host agent's injector (`"a"`, `"7"`,
    /// `"space"`, `"enter"`).
    pub fn key_name(self) -> &'static str {
        const LETTER_NAMES: [&str; 26] = [
            "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p",
            "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
        ];
        const DIGIT_NAMES: [&str; 9] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];

        match self {
            HidKeyCode::Digit0 => "0",
            HidKeyCode::Enter => "enter",
            HidKeyCode::Space => "space",
            other => {
                let raw = other.as_u8();
                if raw < DIGIT_BASE {
                    LETTER_NAMES[(raw - LETTER_BASE) as usize]
                } else {
                    DIGIT_NAMES[(raw - DIGIT_BASE) as usize]
                }
            }
        }
    }
}

/// One typed character: the physical key plus whether Shift must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub key: HidKeyCode,
    pub shift: bool,
}

impl KeyStroke {
    /// Maps a character to the key that produces it.
    ///
    /// Lookup is case-insensitive; the shift flag is set for uppercase
    /// letters only.  Returns `None` for unsupported characters.
    pub fn from_char(c: char) -> Option<Self> {
        let lower = c.to_ascii_lowercase();
        let key = match lower {
            'a'..='z' => LETTERS[(lower as u8 - b'a') as usize],
            '1'..='9' => DIGITS[(lower as u8 - b'1') as usize],
            '0' => HidKeyCode::Digit0,
            ' ' => HidKeyCode::Space,
            '\n' => HidKeyCode::Enter,
            _ => return None,
        };
        Some(Self {
            key,
            shift: c.is_ascii_uppercase(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
