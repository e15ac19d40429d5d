//! Out-of-band pairing code.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Number of digits in a pairing code.
pub const PAIRING_CODE_LEN: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("pairing code must be exactly 6 digits")]
pub struct InvalidPairingCode;

/// A validated code of exactly six ASCII digits.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PairingCode(String);

impl PairingCode {
    /// Validates user input.  Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPairingCode`] unless the trimmed input is exactly six
    /// ASCII digits.
    pub fn parse(input: &str) -> Result<Self, InvalidPairingCode> {
        let trimmed = input.trim();
        if trimmed.len() == PAIRING_CODE_LEN && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(InvalidPairingCode)
        }
    }

    /// Draws a fresh random code from the v4 UUID generator.
    pub fn random() -> Self {
        let value = Uuid::new_v4().as_u128() % 1_000_000;
        Self(format!("{value:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Codes are secrets shown on the host screen; keep them out of debug logs.
impl fmt::Debug for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PairingCode(******)")
    }
}
