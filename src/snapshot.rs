//! The immutable value describing a whole match at one instant.
//!
//! A [`PositionSnapshot`] bundles both board positions, both pairs of
//! reserves, the promoted-square sets and the clocks. Applying a move
//! never mutates a snapshot in place; it produces a fresh one, so every
//! tree node can hang on to its own snapshot and navigation is pure
//! lookup.

use shakmaty::fen::Fen;
use shakmaty::{Bitboard, Chess, Color, EnPassantMode, Position, Role};

use crate::board::{BoardId, PerBoard, PerSide};
use crate::clock::{BoardClocks, TimeControl};
use crate::reserve::Reserve;

/// Full match state at one instant: positions, reserves, promoted
/// squares and clocks for both boards.
#[derive(Clone, Debug)]
pub struct PositionSnapshot {
    pub(crate) boards: PerBoard<Chess>,
    pub(crate) reserves: PerBoard<PerSide<Reserve>>,
    pub(crate) promoted: PerBoard<Bitboard>,
    pub(crate) clocks: PerBoard<BoardClocks>,
}

impl PositionSnapshot {
    /// Both boards in the standard starting position, empty reserves,
    /// full clocks.
    pub fn initial(control: TimeControl) -> Self {
        Self {
            boards: PerBoard::from_fn(|_| Chess::default()),
            reserves: PerBoard::default(),
            promoted: PerBoard::new(Bitboard::EMPTY, Bitboard::EMPTY),
            clocks: PerBoard::from_fn(|_| BoardClocks::fresh(control)),
        }
    }

    pub fn board(&self, id: BoardId) -> &Chess {
        &self.boards[id]
    }

    /// Side to move on a board.
    pub fn turn(&self, id: BoardId) -> Color {
        self.boards[id].turn()
    }

    pub fn reserve(&self, id: BoardId, side: Color) -> &Reserve {
        &self.reserves[id][side]
    }

    /// Squares on a board currently occupied by a piece that came from
    /// a pawn promotion. Such a piece hands over only a pawn when it is
    /// captured.
    pub fn promoted(&self, id: BoardId) -> Bitboard {
        self.promoted[id]
    }

    pub fn clocks(&self, id: BoardId) -> BoardClocks {
        self.clocks[id]
    }

    pub fn is_check(&self, id: BoardId) -> bool {
        self.boards[id].is_check()
    }

    pub fn is_checkmate(&self, id: BoardId) -> bool {
        self.boards[id].is_checkmate()
    }

    /// FEN of one board.
    pub fn fen(&self, id: BoardId) -> String {
        Fen::from_position(self.boards[id].clone(), EnPassantMode::Legal).to_string()
    }

    /// Pieces of one kind across the whole match: both boards and all
    /// four reserves, with promoted pieces counted as the pawns they
    /// started as.
    ///
    /// Because captures move pieces between boards instead of removing
    /// them, these totals stay fixed at two chess sets for the whole of
    /// a match.
    pub fn material_total(&self, role: Role) -> u32 {
        let mut total = 0u32;
        for id in BoardId::ALL {
            let pos = &self.boards[id];
            let promoted = self.promoted[id];
            for sq in pos.board().occupied() {
                if let Some(piece) = pos.board().piece_at(sq) {
                    let counted = if promoted.contains(sq) {
                        Role::Pawn
                    } else {
                        piece.role
                    };
                    if counted == role {
                        total += 1;
                    }
                }
            }
            for side in [Color::White, Color::Black] {
                total += u32::from(self.reserves[id][side].count(role));
            }
        }
        total
    }

    /// Charges one committed half-move against the mover's clock.
    ///
    /// Clock accounting stays out of move application on purpose: the
    /// validator is also used for speculative probes (promotion
    /// dialogs, legality checks) that must not cost any time.
    pub(crate) fn charge_clock(
        &mut self,
        board: BoardId,
        side: Color,
        elapsed: std::time::Duration,
        increment: std::time::Duration,
    ) {
        self.clocks[board].charge(side, elapsed, increment);
    }
}

impl Default for PositionSnapshot {
    fn default() -> Self {
        Self::initial(TimeControl::default())
    }
}
