//! Linear replay of a recorded match.
//!
//! The controller walks a combined move sequence with a cursor: forward
//! parses and applies the next recorded move, backward undoes the last
//! one. Undo never recomputes from the start; each committed step
//! retains the one board, promoted set, clocks and timestamp cursor it
//! replaced, plus the reserve movement it caused, so stepping back
//! restores every field exactly and in constant time per step.
//!
//! Alongside the position the controller keeps a running capture
//! ledger: material each side has taken off each board, at conventional
//! piece values, with promoted victims counted at the pawn value they
//! hand over.

use std::time::Duration;

use shakmaty::{Bitboard, Chess, Color, Role};
use tracing::{debug, info};

use crate::apply::{apply, ApplyOutcome};
use crate::board::{BoardId, PerBoard, PerSide};
use crate::clock::{BoardClocks, BoardTimeline, TimeControl};
use crate::error::{MoveError, MoveResult};
use crate::moves::{PlayedKind, PlayedMove};
use crate::notation::parse_move_text;
use crate::record::{RecordedGame, SequencedMove};
use crate::reserve::piece_value;
use crate::snapshot::PositionSnapshot;

/// Material taken, by board and capturing side, in piece-value points.
pub type CaptureLedger = PerBoard<PerSide<i32>>;

/// Everything one committed step changed, retained for undo.
struct StepRecord {
    played: PlayedMove,
    prior_board: Chess,
    prior_promoted: Bitboard,
    prior_clocks: BoardClocks,
    prior_last_ms: u64,
    /// Reserve credit the step granted: receiving board, receiving
    /// side, piece kind.
    credit: Option<(BoardId, Color, Role)>,
}

/// Replays one recorded match move by move.
pub struct ReplayController {
    control: TimeControl,
    sequence: Vec<SequencedMove>,
    state: PositionSnapshot,
    ledger: CaptureLedger,
    steps: Vec<StepRecord>,
    timelines: PerBoard<BoardTimeline>,
}

impl ReplayController {
    pub fn new(game: &RecordedGame) -> Self {
        Self::from_sequence(game.time_control, game.combined())
    }

    /// A controller positioned before the first move of `sequence`.
    pub fn from_sequence(control: TimeControl, sequence: Vec<SequencedMove>) -> Self {
        info!(moves = sequence.len(), "replay ready");
        Self {
            control,
            sequence,
            state: PositionSnapshot::initial(control),
            ledger: CaptureLedger::default(),
            steps: Vec::new(),
            timelines: PerBoard::default(),
        }
    }

    /// Number of moves already applied; the cursor sits after them.
    pub fn index(&self) -> usize {
        self.steps.len()
    }

    /// Total moves in the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn at_start(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn at_end(&self) -> bool {
        self.steps.len() == self.sequence.len()
    }

    /// Match state at the cursor.
    pub fn snapshot(&self) -> &PositionSnapshot {
        &self.state
    }

    pub fn ledger(&self) -> &CaptureLedger {
        &self.ledger
    }

    /// Points of material `side` has taken off `board` so far.
    pub fn taken(&self, board: BoardId, side: Color) -> i32 {
        self.ledger[board][side]
    }

    /// The most recently applied move, if any.
    pub fn last_played(&self) -> Option<&PlayedMove> {
        self.steps.last().map(|step| &step.played)
    }

    pub fn sequence(&self) -> &[SequencedMove] {
        &self.sequence
    }

    /// Applies the next recorded move. Returns `Ok(false)` at the end
    /// of the sequence.
    ///
    /// # Errors
    ///
    /// A move that does not parse or apply reports why and moves
    /// nothing; the cursor stays put.
    pub fn step_forward(&mut self) -> MoveResult<bool> {
        let entry = match self.sequence.get(self.steps.len()) {
            Some(entry) => entry.clone(),
            None => return Ok(false),
        };
        let board = entry.board;

        if entry.side != self.state.turn(board) {
            return Err(MoveError::IllegalMove {
                board,
                text: entry.text.clone(),
            });
        }
        let attempted = parse_move_text(board, self.state.board(board), &entry.text)?;
        let (mut snapshot, played) = match apply(&self.state, &attempted)? {
            ApplyOutcome::Applied { snapshot, played } => (snapshot, played),
            // recorded promotions must carry their piece
            ApplyOutcome::NeedsPromotion { .. } => {
                return Err(MoveError::IllegalMove {
                    board,
                    text: entry.text.clone(),
                });
            }
        };

        let prior_last_ms = self.timelines[board].last_ms();
        let elapsed = self.timelines[board].advance(entry.at_ms);
        snapshot.charge_clock(board, played.side, elapsed, self.control.increment());

        let credit = played
            .captured()
            .map(|kind| (board.partner(), !played.side, kind));
        if let Some((_, _, kind)) = credit {
            self.ledger[board][played.side] += piece_value(kind);
        }

        self.steps.push(StepRecord {
            prior_board: self.state.boards[board].clone(),
            prior_promoted: self.state.promoted[board],
            prior_clocks: self.state.clocks[board],
            prior_last_ms,
            credit,
            played,
        });
        self.state = snapshot;
        debug!(index = self.steps.len(), %board, "replay advanced");
        Ok(true)
    }

    /// Undoes the last applied move. Returns `false` at the start.
    ///
    /// Exact inverse of [`ReplayController::step_forward`]: board,
    /// promoted squares, clocks, timestamp cursor, reserves and ledger
    /// all return to their prior values.
    pub fn step_backward(&mut self) -> bool {
        let Some(step) = self.steps.pop() else {
            return false;
        };
        let board = step.played.board;

        self.state.boards[board] = step.prior_board;
        self.state.promoted[board] = step.prior_promoted;
        self.state.clocks[board] = step.prior_clocks;
        self.timelines[board].rewind_to(step.prior_last_ms);

        match step.played.kind {
            // a drop spent a reserve piece; hand it back
            PlayedKind::Drop { piece, .. } => {
                self.state.reserves[board][step.played.side].add(piece);
            }
            PlayedKind::Normal { .. } => {
                if let Some((credit_board, credit_side, kind)) = step.credit {
                    self.state.reserves[credit_board][credit_side].remove(kind);
                    self.ledger[board][step.played.side] -= piece_value(kind);
                }
            }
        }
        debug!(index = self.steps.len(), %board, "replay rewound");
        true
    }

    /// Steps to just after move `index`, clamped to the sequence
    /// length. Implemented as repeated single steps, so a sequence that
    /// fails partway leaves the cursor on the last good move and
    /// reports the failure.
    pub fn jump_to(&mut self, index: usize) -> MoveResult<()> {
        let target = index.min(self.sequence.len());
        while self.steps.len() > target {
            if !self.step_backward() {
                break;
            }
        }
        while self.steps.len() < target {
            if !self.step_forward()? {
                break;
            }
        }
        Ok(())
    }

    /// Thinking time per move over the whole sequence, in order,
    /// derived from the recorded timestamps with the same clamping the
    /// clocks use. Independent of the cursor.
    pub fn elapsed_per_move(&self) -> Vec<Duration> {
        let mut timelines: PerBoard<BoardTimeline> = PerBoard::default();
        self.sequence
            .iter()
            .map(|entry| timelines[entry.board].advance(entry.at_ms))
            .collect()
    }
}
