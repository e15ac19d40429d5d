//! Line-based touch script reader.
//!
//! Without a touch panel attached the binary reads commands from stdin, one
//! per line:
//!
//! ```text
//! # comment
//! down 0 100 200 0
//! move 0 140 200 16
//! up 0 140 200 32
//! move 0 100 900 40; move 1 160 900 40    # one frame, two pointers
//! cancel 48
//! type Hello world
//! media play_pause
//! pair 123456
//! ```
//!
//! Touch lines take `<pointer> <x> <y> <t_ms>`.  Several touch samples joined
//! with `;` form one frame, delivered to the interpreter together.  `cancel`
//! takes an optional timestamp.

use std::str::FromStr;

use rb_core::protocol::messages::MediaCommand;
use rb_core::{TouchPhase, TouchSample};
use thiserror::Error;

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    /// One or more samples forming a single frame.
    Touch(Vec<TouchSample>),
    /// Type text through the key mapping.
    Type(String),
    /// Send a media command.
    Media(MediaCommand),
    /// Start pairing with the given code.
    Pair(String),
}

/// A script line that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{command}' expects {expected} argument(s)")]
    WrongArity {
        command: String,
        expected: &'static str,
    },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unknown media command '{0}'")]
    UnknownMedia(String),
}

/// Parses one line.  Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>, ScriptError> {
    let line = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim_start()),
        None => (trimmed, ""),
    };

    match head {
        "type" => Ok(Some(ScriptCommand::Type(rest.to_string()))),
        "media" => {
            let name = single_arg("media", rest)?;
            MediaCommand::from_str(name)
                .map(|c| Some(ScriptCommand::Media(c)))
                .map_err(|_| ScriptError::UnknownMedia(name.to_string()))
        }
        "pair" => Ok(Some(ScriptCommand::Pair(single_arg("pair", rest)?.to_string()))),
        _ => {
            let samples = trimmed
                .split(';')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(parse_sample)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(ScriptCommand::Touch(samples)))
        }
    }
}

fn single_arg<'a>(command: &str, rest: &'a str) -> Result<&'a str, ScriptError> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(ScriptError::WrongArity {
            command: command.to_string(),
            expected: "1",
        }),
    }
}

fn parse_sample(part: &str) -> Result<TouchSample, ScriptError> {
    let fields: Vec<&str> = part.split_whitespace().collect();
    let (command, args) = match fields.split_first() {
        Some(split) => split,
        None => return Err(ScriptError::UnknownCommand(String::new())),
    };

    let phase = match *command {
        "down" => TouchPhase::Down,
        "move" => TouchPhase::Move,
        "up" => TouchPhase::Up,
        "cancel" => {
            return match args {
                [] => Ok(TouchSample::cancel(0)),
                [ts] => Ok(TouchSample::cancel(number(ts)?)),
                _ => Err(ScriptError::WrongArity {
                    command: "cancel".to_string(),
                    expected: "0 or 1",
                }),
            };
        }
        other => return Err(ScriptError::UnknownCommand(other.to_string())),
    };

    match args {
        [pointer, x, y, ts] => Ok(TouchSample::new(
            number(pointer)?,
            phase,
            number(x)?,
            number(y)?,
            number(ts)?,
        )),
        _ => Err(ScriptError::WrongArity {
            command: (*command).to_string(),
            expected: "4",
        }),
    }
}

fn number<T: FromStr>(text: &str) -> Result<T, ScriptError> {
    text.parse()
        .map_err(|_| ScriptError::InvalidNumber(text.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
