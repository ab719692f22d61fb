//! Recorded games: the serialized form a finished match arrives in.
//!
//! A record keeps the two boards' move lists separate, the way the
//! boards were actually played. Analysis wants one timeline, so
//! [`RecordedGame::combined`] interleaves them by timestamp into a
//! single sequence of board-tagged moves.
//!
//! The JSON shape:
//!
//! ```json
//! {
//!   "time_control": { "main_ms": 180000, "increment_ms": 0 },
//!   "board_a": {
//!     "white": "alice", "black": "bob",
//!     "moves": [ { "text": "e4", "at_ms": 1200 }, { "text": "e5", "at_ms": 2050 } ]
//!   },
//!   "board_b": {
//!     "white": "carol", "black": "dave",
//!     "moves": [ { "text": "d4", "at_ms": 900 } ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::board::BoardId;
use crate::clock::TimeControl;

/// One move as recorded: its text plus an optional wall-clock offset in
/// milliseconds from the start of the match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedMove {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_ms: Option<u64>,
}

impl TimedMove {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            at_ms: None,
        }
    }

    pub fn at(text: impl Into<String>, at_ms: u64) -> Self {
        Self {
            text: text.into(),
            at_ms: Some(at_ms),
        }
    }
}

/// One board's half of a recorded match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub white: String,
    pub black: String,
    #[serde(default)]
    pub moves: Vec<TimedMove>,
}

/// A finished bughouse match as loaded from disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedGame {
    #[serde(default)]
    pub time_control: TimeControl,
    pub board_a: BoardRecord,
    pub board_b: BoardRecord,
}

impl RecordedGame {
    pub fn board(&self, id: BoardId) -> &BoardRecord {
        match id {
            BoardId::A => &self.board_a,
            BoardId::B => &self.board_b,
        }
    }

    /// Interleaves both boards' move lists into one timeline.
    ///
    /// Within a board, moves alternate sides starting with White and
    /// keep their recorded order no matter what their timestamps say; a
    /// missing or regressing timestamp inherits its predecessor's. The
    /// merge is stable, so simultaneous moves keep board `A` first.
    pub fn combined(&self) -> Vec<SequencedMove> {
        let mut entries: Vec<(u64, SequencedMove)> = Vec::new();
        for id in BoardId::ALL {
            let mut last_ms = 0u64;
            for (i, timed) in self.board(id).moves.iter().enumerate() {
                last_ms = timed.at_ms.map_or(last_ms, |t| t.max(last_ms));
                let side = if i % 2 == 0 {
                    Color::White
                } else {
                    Color::Black
                };
                entries.push((
                    last_ms,
                    SequencedMove {
                        board: id,
                        side,
                        text: timed.text.clone(),
                        at_ms: timed.at_ms,
                    },
                ));
            }
        }
        entries.sort_by_key(|(key, _)| *key);
        entries.into_iter().map(|(_, entry)| entry).collect()
    }
}

/// A recorded move tagged with its board and mover, placed on the
/// match-wide timeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencedMove {
    pub board: BoardId,
    pub side: Color,
    pub text: String,
    pub at_ms: Option<u64>,
}
