//! Gesture interpreter: turns a stream of raw touch samples into input intents.
//!
//! # How gestures are recognised (for beginners)
//!
//! A touch screen reports each finger ("pointer") separately: when it lands
//! (`Down`), while it slides (`Move`) and when it lifts (`Up`).  A touchpad
//! has to guess what the user *meant* from those samples:
//!
//! - One finger sliding → move the cursor by the finger's delta.
//! - One finger briefly touching and lifting without travelling far → a
//!   left click ("tap").
//! - Two fingers sliding vertically → scroll the wheel.
//!
//! The interpreter is a small finite-state machine with one state per
//! "contact episode" (the time between the first finger landing and the last
//! finger lifting):
//!
//! ```text
//!            1st Down                 2nd Down
//!   Idle ──────────────► Tracking1 ──────────────► Tracking2
//!    ▲                     │   ▲                       │
//!    │      last Up        │   └────── Up (2 → 1) ─────┘
//!    └─────────────────────┘  (tap → Click, if still pending)
//! ```
//!
//! Whenever the number of fingers changes, the position trackers are
//! re-seeded from the current contacts so stale deltas never leak into a
//! Move or Scroll.
//!
//! Samples must be fed in arrival order from a single thread.  Malformed
//! samples (a Move or Up for a pointer that never went down) are ignored.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::intent::{InputIntent, MouseButton};

/// Lower bound of the cursor speed multiplier.
pub const MIN_CURSOR_SPEED: f32 = 0.5;

/// Upper bound of the cursor speed multiplier.
pub const MAX_CURSOR_SPEED: f32 = 4.0;

// ── Touch samples ─────────────────────────────────────────────────────────────

/// What happened to a pointer in one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    /// The platform aborted the whole gesture (e.g. a palm was detected).
    Cancel,
}

/// One raw touch report for a single pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub pointer_id: u32,
    pub phase: TouchPhase,
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl TouchSample {
    pub fn new(pointer_id: u32, phase: TouchPhase, x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self {
            pointer_id,
            phase,
            x,
            y,
            timestamp_ms,
        }
    }

    pub fn down(pointer_id: u32, x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self::new(pointer_id, TouchPhase::Down, x, y, timestamp_ms)
    }

    pub fn moved(pointer_id: u32, x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self::new(pointer_id, TouchPhase::Move, x, y, timestamp_ms)
    }

    pub fn up(pointer_id: u32, x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self::new(pointer_id, TouchPhase::Up, x, y, timestamp_ms)
    }

    pub fn cancel(timestamp_ms: u64) -> Self {
        Self::new(0, TouchPhase::Cancel, 0.0, 0.0, timestamp_ms)
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tuning constants for the interpreter.  None of these are protocol values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Multiplier applied to single-finger deltas, bounded to
    /// [`MIN_CURSOR_SPEED`, `MAX_CURSOR_SPEED`].
    #[serde(default = "default_cursor_speed")]
    pub cursor_speed: f32,
    /// Multiplier applied to two-finger vertical deltas.
    #[serde(default = "default_scroll_gain")]
    pub scroll_gain: f32,
    /// A touch lasting at least this long is never a tap.
    #[serde(default = "default_tap_timeout_ms")]
    pub tap_timeout_ms: u64,
    /// Manhattan distance a finger may travel and still count as a tap.
    #[serde(default = "default_tap_slop")]
    pub tap_slop: f32,
    /// Two-finger center motion at or below this many units is ignored.
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f32,
}

fn default_cursor_speed() -> f32 {
    1.0
}
fn default_scroll_gain() -> f32 {
    2.0
}
fn default_tap_timeout_ms() -> u64 {
    180
}
fn default_tap_slop() -> f32 {
    25.0
}
fn default_scroll_threshold() -> f32 {
    1.0
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cursor_speed: default_cursor_speed(),
            scroll_gain: default_scroll_gain(),
            tap_timeout_ms: default_tap_timeout_ms(),
            tap_slop: default_tap_slop(),
            scroll_threshold: default_scroll_threshold(),
        }
    }
}

impl GestureConfig {
    /// Returns a copy with `cursor_speed` clamped into its allowed range.
    ///
    /// A non-finite speed falls back to the default.
    pub fn sanitized(mut self) -> Self {
        self.cursor_speed = if self.cursor_speed.is_finite() {
            self.cursor_speed.clamp(MIN_CURSOR_SPEED, MAX_CURSOR_SPEED)
        } else {
            default_cursor_speed()
        };
        self
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

impl Point {
    fn of(sample: &TouchSample) -> Self {
        Self {
            x: sample.x,
            y: sample.y,
        }
    }

    fn manhattan(self, other: Point) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Interpreter state for the current contact episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    /// No finger on the surface.
    Idle,
    /// Exactly one finger down.
    Tracking1 {
        down: (f32, f32),
        down_ts: u64,
        /// Still a tap candidate: no motion beyond the slop, no second finger.
        pending_tap: bool,
        last: (f32, f32),
        /// Sub-unit remainder of the scaled deltas, carried into the next move.
        carry: (f32, f32),
    },
    /// Two or more fingers down; the two oldest drive the scroll.
    Tracking2 {
        last_center_y: f32,
        /// Sub-unit remainder of the gain-scaled wheel delta.
        carry: f32,
    },
}

/// Converts touch samples into [`InputIntent`]s.
///
/// Owns the [`GestureState`] of the current episode plus the ordered set of
/// active pointers.  Feed it with [`on_sample`](Self::on_sample),
/// [`on_frame`](Self::on_frame) or [`interpret`](Self::interpret).
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    config: GestureConfig,
    state: GestureState,
    /// Active pointers in the order they went down.
    pointers: Vec<(u32, Point)>,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config: config.sanitized(),
            state: GestureState::Idle,
            pointers: Vec::with_capacity(4),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Number of pointers currently down.
    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    /// Drops all contacts and returns to [`GestureState::Idle`].
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.state = GestureState::Idle;
    }

    /// Processes one sample and returns the intent it completes, if any.
    pub fn on_sample(&mut self, sample: TouchSample) -> Option<InputIntent> {
        match sample.phase {
            TouchPhase::Down => {
                self.pointer_down(&sample);
                None
            }
            TouchPhase::Move => {
                if !self.update_position(&sample) {
                    return None;
                }
                self.evaluate_motion()
            }
            TouchPhase::Up => self.pointer_up(&sample),
            TouchPhase::Cancel => {
                debug!("gesture cancelled with {} active pointer(s)", self.pointers.len());
                self.reset();
                None
            }
        }
    }

    /// Processes samples that the platform reported together in one event.
    ///
    /// All `Move` samples of the frame update their pointers before motion is
    /// evaluated, so a two-finger drag yields one `Scroll` per frame instead
    /// of one per finger.  Other phases are handled in order.
    pub fn on_frame(&mut self, samples: &[TouchSample]) -> Vec<InputIntent> {
        let mut out = Vec::new();
        let mut moved = false;

        for sample in samples {
            if sample.phase == TouchPhase::Move {
                moved |= self.update_position(sample);
                continue;
            }
            if moved {
                out.extend(self.evaluate_motion());
                moved = false;
            }
            out.extend(self.on_sample(*sample));
        }
        if moved {
            out.extend(self.evaluate_motion());
        }
        out
    }

    /// Adapts an iterator of samples into a lazy iterator of intents.
    pub fn interpret<I>(&mut self, samples: I) -> Intents<'_, I::IntoIter>
    where
        I: IntoIterator<Item = TouchSample>,
    {
        Intents {
            interpreter: self,
            samples: samples.into_iter(),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn pointer_down(&mut self, sample: &TouchSample) {
        let point = Point::of(sample);
        if let Some(entry) = self.pointers.iter_mut().find(|(id, _)| *id == sample.pointer_id) {
            // Duplicate Down for a known pointer: treat as a position update.
            entry.1 = point;
            return;
        }

        let was_idle = self.pointers.is_empty();
        self.pointers.push((sample.pointer_id, point));
        if was_idle {
            self.state = GestureState::Tracking1 {
                down: (point.x, point.y),
                down_ts: sample.timestamp_ms,
                pending_tap: true,
                last: (point.x, point.y),
                carry: (0.0, 0.0),
            };
        } else {
            self.reseed(sample.timestamp_ms);
        }
    }

    fn pointer_up(&mut self, sample: &TouchSample) -> Option<InputIntent> {
        let Some(index) = self.pointers.iter().position(|(id, _)| *id == sample.pointer_id) else {
            debug!(pointer = sample.pointer_id, "ignoring Up for unknown pointer");
            return None;
        };
        self.pointers.remove(index);

        if !self.pointers.is_empty() {
            self.reseed(sample.timestamp_ms);
            return None;
        }

        let intent = match self.state {
            GestureState::Tracking1 {
                down,
                down_ts,
                pending_tap: true,
                ..
            } => {
                let elapsed = sample.timestamp_ms.saturating_sub(down_ts);
                let travel = Point { x: down.0, y: down.1 }.manhattan(Point::of(sample));
                (elapsed < self.config.tap_timeout_ms && travel < self.config.tap_slop).then_some(
                    InputIntent::Click {
                        button: MouseButton::Left,
                    },
                )
            }
            _ => None,
        };
        self.state = GestureState::Idle;
        intent
    }

    /// Returns `false` for samples that do not belong to an active pointer.
    fn update_position(&mut self, sample: &TouchSample) -> bool {
        match self.pointers.iter_mut().find(|(id, _)| *id == sample.pointer_id) {
            Some(entry) => {
                entry.1 = Point::of(sample);
                true
            }
            None => {
                debug!(pointer = sample.pointer_id, "ignoring Move for unknown pointer");
                false
            }
        }
    }

    /// Re-seeds the trackers after the contact count changed.
    fn reseed(&mut self, timestamp_ms: u64) {
        self.state = match self.pointers.as_slice() {
            [] => GestureState::Idle,
            [(_, p)] => GestureState::Tracking1 {
                down: (p.x, p.y),
                down_ts: timestamp_ms,
                pending_tap: false,
                last: (p.x, p.y),
                carry: (0.0, 0.0),
            },
            [(_, a), (_, b), ..] => GestureState::Tracking2 {
                last_center_y: (a.y + b.y) / 2.0,
                carry: 0.0,
            },
        };
    }

    fn evaluate_motion(&mut self) -> Option<InputIntent> {
        let speed = self.config.cursor_speed;
        let slop = self.config.tap_slop;

        match &mut self.state {
            GestureState::Idle => None,
            GestureState::Tracking1 {
                down,
                pending_tap,
                last,
                carry,
                ..
            } => {
                let (_, current) = *self.pointers.first()?;
                if *pending_tap {
                    let travel = Point { x: down.0, y: down.1 }.manhattan(current);
                    if travel < slop {
                        return None;
                    }
                    *pending_tap = false;
                }

                let raw_x = current.x - last.0;
                let raw_y = current.y - last.1;
                if raw_x == 0.0 && raw_y == 0.0 {
                    return None;
                }
                *last = (current.x, current.y);

                let scaled_x = raw_x * speed + carry.0;
                let scaled_y = raw_y * speed + carry.1;
                let dx = scaled_x.trunc();
                let dy = scaled_y.trunc();
                *carry = (scaled_x - dx, scaled_y - dy);

                if dx == 0.0 && dy == 0.0 {
                    return None;
                }
                Some(InputIntent::Move {
                    dx: dx as i32,
                    dy: dy as i32,
                })
            }
            GestureState::Tracking2 {
                last_center_y,
                carry,
            } => {
                let [(_, a), (_, b), ..] = self.pointers.as_slice() else {
                    return None;
                };
                let center_y = (a.y + b.y) / 2.0;
                let delta = center_y - *last_center_y;
                if delta.abs() <= self.config.scroll_threshold {
                    return None;
                }
                *last_center_y = center_y;

                // Inverted so an upward drag scrolls content up.
                let scaled = -delta * self.config.scroll_gain + *carry;
                let delta_y = scaled.trunc();
                *carry = scaled - delta_y;
                (delta_y != 0.0).then_some(InputIntent::Scroll {
                    delta_x: 0,
                    delta_y: delta_y as i32,
                })
            }
        }
    }
}

/// Lazy intent iterator returned by [`GestureInterpreter::interpret`].
pub struct Intents<'a, I> {
    interpreter: &'a mut GestureInterpreter,
    samples: I,
}

impl<I> Iterator for Intents<'_, I>
where
    I: Iterator<Item = TouchSample>,
{
    type Item = InputIntent;

    fn next(&mut self) -> Option<InputIntent> {
        for sample in self.samples.by_ref() {
            if let Some(intent) = self.interpreter.on_sample(sample) {
                return Some(intent);
            }
        }
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter() -> GestureInterpreter {
        GestureInterpreter::default()
    }

    fn moves_only(intents: &[InputIntent]) -> (i32, i32) {
        intents.iter().fold((0, 0), |(sx, sy), intent| match intent {
            InputIntent::Move { dx, dy } => (sx + dx, sy + dy),
            _ => (sx, sy),
        })
    }

    // ── Taps ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_short_touch_within_slop_is_a_left_click_without_moves() {
        // Arrange
        let mut g = interpreter();

        // Act
        let intents: Vec<_> = g
            .interpret([
                TouchSample::down(0, 100.0, 100.0, 0),
                TouchSample::moved(0, 105.0, 103.0, 50),
                TouchSample::up(0, 108.0, 106.0, 120),
            ])
            .collect();

        // Assert
        assert_eq!(
            intents,
            vec![InputIntent::Click {
                button: MouseButton::Left
            }]
        );
        assert_eq!(*g.state(), GestureState::Idle);
    }

    #[test]
    fn test_touch_held_past_timeout_is_not_a_click() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 10.0, 10.0, 0));
        let intent = g.on_sample(TouchSample::up(0, 10.0, 10.0, 180));
        assert_eq!(intent, None, "elapsed == timeout must not click");
    }

    #[test]
    fn test_up_far_from_down_is_not_a_click() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 0.0, 0.0, 0));
        let intent = g.on_sample(TouchSample::up(0, 20.0, 5.0, 50));
        assert_eq!(intent, None, "manhattan distance 25 is not below the slop");
    }

    #[test]
    fn test_motion_beyond_slop_cancels_tap_and_emits_full_delta() {
        // Arrange
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 0.0, 0.0, 0));

        // Act
        let absorbed = g.on_sample(TouchSample::moved(0, 10.0, 0.0, 10));
        let first = g.on_sample(TouchSample::moved(0, 30.0, 0.0, 20));
        let back = g.on_sample(TouchSample::moved(0, 0.0, 0.0, 30));
        let up = g.on_sample(TouchSample::up(0, 0.0, 0.0, 40));

        // Assert
        assert_eq!(absorbed, None);
        assert_eq!(first, Some(InputIntent::Move { dx: 30, dy: 0 }));
        assert_eq!(back, Some(InputIntent::Move { dx: -30, dy: 0 }));
        assert_eq!(up, None, "tap stays cancelled even when the finger returns");
    }

    // ── Cursor speed ──────────────────────────────────────────────────────────

    #[test]
    fn test_cursor_speed_is_clamped_into_range() {
        let slow = GestureInterpreter::new(GestureConfig {
            cursor_speed: 0.1,
            ..GestureConfig::default()
        });
        let fast = GestureInterpreter::new(GestureConfig {
            cursor_speed: 9.0,
            ..GestureConfig::default()
        });
        let nan = GestureInterpreter::new(GestureConfig {
            cursor_speed: f32::NAN,
            ..GestureConfig::default()
        });

        assert_eq!(slow.config().cursor_speed, MIN_CURSOR_SPEED);
        assert_eq!(fast.config().cursor_speed, MAX_CURSOR_SPEED);
        assert_eq!(nan.config().cursor_speed, 1.0);
    }

    #[test]
    fn test_fractional_speed_carries_remainder_into_next_move() {
        // Arrange
        let mut g = GestureInterpreter::new(GestureConfig {
            cursor_speed: 0.5,
            ..GestureConfig::default()
        });
        g.on_sample(TouchSample::down(0, 0.0, 0.0, 0));

        // Act
        let a = g.on_sample(TouchSample::moved(0, 30.0, 0.0, 10));
        let b = g.on_sample(TouchSample::moved(0, 31.0, 0.0, 20));
        let c = g.on_sample(TouchSample::moved(0, 32.0, 0.0, 30));

        // Assert
        assert_eq!(a, Some(InputIntent::Move { dx: 15, dy: 0 }));
        assert_eq!(b, None, "half a unit is carried");
        assert_eq!(c, Some(InputIntent::Move { dx: 1, dy: 0 }));
    }

    #[test]
    fn test_drag_sum_matches_scaled_displacement() {
        let mut g = GestureInterpreter::new(GestureConfig {
            cursor_speed: 1.5,
            ..GestureConfig::default()
        });
        let mut samples = vec![TouchSample::down(0, 0.0, 0.0, 0)];
        for i in 1..=40u64 {
            samples.push(TouchSample::moved(0, i as f32 * 3.3, i as f32 * -1.7, i * 10));
        }
        samples.push(TouchSample::up(0, 132.0, -68.0, 500));

        let intents: Vec<_> = g.interpret(samples).collect();
        let (sx, sy) = moves_only(&intents);

        assert!((sx - 198).abs() <= 1, "sum x = {sx}");
        assert!((sy - -102).abs() <= 1, "sum y = {sy}");
        assert!(!intents.iter().any(|i| matches!(i, InputIntent::Click { .. })));
    }

    // ── Two-finger scroll ─────────────────────────────────────────────────────

    #[test]
    fn test_two_finger_drag_in_one_frame_scrolls_once() {
        // Arrange: center starts at (200, 300)
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 190.0, 300.0, 0));
        g.on_sample(TouchSample::down(1, 210.0, 300.0, 5));

        // Act: center moves to (200, 280)
        let intents = g.on_frame(&[
            TouchSample::moved(0, 190.0, 280.0, 30),
            TouchSample::moved(1, 210.0, 280.0, 30),
        ]);

        // Assert
        assert_eq!(
            intents,
            vec![InputIntent::Scroll {
                delta_x: 0,
                delta_y: 40
            }]
        );
    }

    #[test]
    fn test_second_finger_down_emits_nothing_and_cancels_tap() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 100.0, 100.0, 0));
        let second = g.on_sample(TouchSample::down(1, 400.0, 900.0, 10));
        g.on_sample(TouchSample::up(1, 400.0, 900.0, 20));
        let last_up = g.on_sample(TouchSample::up(0, 100.0, 100.0, 30));

        assert_eq!(second, None);
        assert_eq!(last_up, None, "a two-finger touch is never a tap");
    }

    #[test]
    fn test_scroll_below_threshold_is_ignored() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 0.0, 100.0, 0));
        g.on_sample(TouchSample::down(1, 50.0, 100.0, 0));

        let intents = g.on_frame(&[
            TouchSample::moved(0, 0.0, 101.0, 10),
            TouchSample::moved(1, 50.0, 101.0, 10),
        ]);

        assert!(intents.is_empty());
    }

    #[test]
    fn test_horizontal_two_finger_drag_never_scrolls_horizontally() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 0.0, 100.0, 0));
        g.on_sample(TouchSample::down(1, 50.0, 100.0, 0));

        let intents = g.on_frame(&[
            TouchSample::moved(0, 80.0, 100.0, 10),
            TouchSample::moved(1, 130.0, 100.0, 10),
        ]);

        assert!(intents.is_empty());
    }

    #[test]
    fn test_lifting_back_to_one_finger_reseeds_without_jump() {
        // Arrange
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 0.0, 0.0, 0));
        g.on_sample(TouchSample::down(1, 500.0, 500.0, 0));
        g.on_sample(TouchSample::up(0, 0.0, 0.0, 10));

        // Act
        let intent = g.on_sample(TouchSample::moved(1, 505.0, 500.0, 20));

        // Assert
        assert_eq!(intent, Some(InputIntent::Move { dx: 5, dy: 0 }));
    }

    #[test]
    fn test_third_finger_keeps_scrolling_on_two_oldest() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 0.0, 100.0, 0));
        g.on_sample(TouchSample::down(1, 10.0, 100.0, 0));
        g.on_sample(TouchSample::down(2, 20.0, 100.0, 0));

        let moved_third = g.on_sample(TouchSample::moved(2, 20.0, 0.0, 10));
        let moved_oldest = g.on_frame(&[
            TouchSample::moved(0, 0.0, 110.0, 20),
            TouchSample::moved(1, 10.0, 110.0, 20),
        ]);

        assert_eq!(moved_third, None);
        assert_eq!(
            moved_oldest,
            vec![InputIntent::Scroll {
                delta_x: 0,
                delta_y: -20
            }]
        );
    }

    #[test]
    fn test_scroll_gain_is_configurable() {
        let mut g = GestureInterpreter::new(GestureConfig {
            scroll_gain: 0.5,
            ..GestureConfig::default()
        });
        g.on_sample(TouchSample::down(0, 0.0, 300.0, 0));
        g.on_sample(TouchSample::down(1, 10.0, 300.0, 0));

        let intents = g.on_frame(&[
            TouchSample::moved(0, 0.0, 280.0, 10),
            TouchSample::moved(1, 10.0, 280.0, 10),
        ]);

        assert_eq!(
            intents,
            vec![InputIntent::Scroll {
                delta_x: 0,
                delta_y: 10
            }]
        );
    }

    #[test]
    fn test_low_gain_slow_scroll_accumulates_instead_of_vanishing() {
        // Arrange: each frame moves the center 3 px, 0.25 gain → 0.75 per frame
        let mut g = GestureInterpreter::new(GestureConfig {
            scroll_gain: 0.25,
            ..GestureConfig::default()
        });
        g.on_sample(TouchSample::down(0, 0.0, 300.0, 0));
        g.on_sample(TouchSample::down(1, 10.0, 300.0, 0));

        // Act
        let intents: Vec<InputIntent> = (1..=4)
            .flat_map(|i| {
                let y = 300.0 - 3.0 * i as f32;
                g.on_frame(&[
                    TouchSample::moved(0, 0.0, y, i * 10),
                    TouchSample::moved(1, 10.0, y, i * 10),
                ])
            })
            .collect();

        // Assert: 4 × 0.75 = 3 wheel units in total
        let total: i32 = intents
            .iter()
            .map(|intent| match intent {
                InputIntent::Scroll { delta_y, .. } => *delta_y,
                _ => 0,
            })
            .sum();
        assert_eq!(total, 3);
        assert!(!intents.is_empty());
    }

    // ── Malformed streams and cancel ──────────────────────────────────────────

    #[test]
    fn test_move_before_any_down_is_ignored() {
        let mut g = interpreter();
        assert_eq!(g.on_sample(TouchSample::moved(0, 50.0, 50.0, 0)), None);
        assert_eq!(g.on_sample(TouchSample::up(3, 50.0, 50.0, 5)), None);
        assert_eq!(*g.state(), GestureState::Idle);
        assert_eq!(g.active_pointers(), 0);
    }

    #[test]
    fn test_unknown_pointer_move_does_not_disturb_tap() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 10.0, 10.0, 0));
        g.on_sample(TouchSample::moved(7, 900.0, 900.0, 10));
        let up = g.on_sample(TouchSample::up(0, 10.0, 10.0, 50));
        assert_eq!(
            up,
            Some(InputIntent::Click {
                button: MouseButton::Left
            })
        );
    }

    #[test]
    fn test_cancel_mid_tap_never_clicks() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 10.0, 10.0, 0));
        assert_eq!(g.on_sample(TouchSample::cancel(20)), None);
        assert_eq!(g.on_sample(TouchSample::up(0, 10.0, 10.0, 40)), None);
        assert_eq!(*g.state(), GestureState::Idle);
    }

    #[test]
    fn test_new_episode_after_all_up_starts_fresh() {
        let mut g = interpreter();
        g.on_sample(TouchSample::down(0, 0.0, 0.0, 0));
        g.on_sample(TouchSample::moved(0, 100.0, 0.0, 10));
        g.on_sample(TouchSample::up(0, 100.0, 0.0, 20));

        g.on_sample(TouchSample::down(0, 500.0, 500.0, 1000));
        let up = g.on_sample(TouchSample::up(0, 501.0, 500.0, 1050));

        assert_eq!(
            up,
            Some(InputIntent::Click {
                button: MouseButton::Left
            })
        );
    }

    #[test]
    fn test_gesture_config_deserializes_with_defaults() {
        let cfg: GestureConfig = serde_json::from_str(r#"{"cursor_speed": 2.5}"#).unwrap();
        assert_eq!(cfg.cursor_speed, 2.5);
        assert_eq!(cfg.scroll_gain, 2.0);
        assert_eq!(cfg.tap_timeout_ms, 180);
    }
}
