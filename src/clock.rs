//! Match clocks.
//!
//! Each board carries two countdown clocks. The engine never runs them
//! in real time; recorded move timestamps are turned into elapsed spans
//! and charged against the mover when a half-move is committed, so a
//! position snapshot always shows the clocks exactly as they stood
//! after its last move.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Starting time and per-move increment, shared by both boards.
///
/// Stored in milliseconds to match recorded game files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    /// Main time each player starts with.
    pub main_ms: u64,
    /// Added to the mover's clock after every committed half-move.
    #[serde(default)]
    pub increment_ms: u64,
}

impl TimeControl {
    pub fn new(main_ms: u64, increment_ms: u64) -> Self {
        Self {
            main_ms,
            increment_ms,
        }
    }

    pub fn main(&self) -> Duration {
        Duration::from_millis(self.main_ms)
    }

    pub fn increment(&self) -> Duration {
        Duration::from_millis(self.increment_ms)
    }
}

impl Default for TimeControl {
    /// Five minutes, no increment.
    fn default() -> Self {
        Self::new(300_000, 0)
    }
}

/// Remaining time for both sides of one board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardClocks {
    pub white: Duration,
    pub black: Duration,
}

impl BoardClocks {
    pub fn fresh(control: TimeControl) -> Self {
        Self {
            white: control.main(),
            black: control.main(),
        }
    }

    pub fn remaining(&self, side: Color) -> Duration {
        match side {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Charges one committed half-move against `side`: the elapsed span
    /// is deducted and the increment granted. Clamps at zero rather
    /// than going negative.
    pub(crate) fn charge(&mut self, side: Color, elapsed: Duration, increment: Duration) {
        let slot = match side {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        *slot = slot.saturating_sub(elapsed) + increment;
    }
}

/// Per-board timestamp cursor for replaying recorded move times.
///
/// Recorded timestamps are wall-clock offsets from the start of the
/// match. Files in the wild contain gaps and occasional out-of-order
/// values, so a missing or regressing timestamp is clamped to the
/// previous one and reads as zero elapsed time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoardTimeline {
    last_ms: u64,
}

impl BoardTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the last committed move on this board.
    pub fn last_ms(&self) -> u64 {
        self.last_ms
    }

    /// Restores the cursor to an earlier timestamp when a move is
    /// undone.
    pub(crate) fn rewind_to(&mut self, last_ms: u64) {
        self.last_ms = last_ms;
    }

    /// Advances past one move and returns the elapsed span it consumed.
    pub fn advance(&mut self, at_ms: Option<u64>) -> Duration {
        let at = at_ms.map_or(self.last_ms, |t| t.max(self.last_ms));
        let elapsed = at - self.last_ms;
        self.last_ms = at;
        Duration::from_millis(elapsed)
    }
}
