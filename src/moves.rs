//! Half-move representations.
//!
//! [`AttemptedMove`] is what a caller asks for, before any validation:
//! a source/target pair or a reserve drop. [`PlayedMove`] is what the
//! engine actually committed, carrying the metadata that reserves,
//! display and undo need. The two are deliberately separate types so
//! unvalidated input can never be stored in the tree.

use std::fmt;

use shakmaty::{Color, Role, Square};

use crate::board::BoardId;

/// A half-move as attempted by a caller.
///
/// `Normal` covers ordinary moves and castling; castle notation is
/// normalized to a king source/target pair before it gets here. `Drop`
/// places a piece from the reserve on an empty square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptedMove {
    Normal {
        board: BoardId,
        from: Square,
        to: Square,
        /// Chosen promotion piece, if the caller already picked one.
        promotion: Option<Role>,
    },
    Drop {
        board: BoardId,
        side: Color,
        piece: Role,
        to: Square,
    },
}

impl AttemptedMove {
    pub fn board(&self) -> BoardId {
        match self {
            AttemptedMove::Normal { board, .. } | AttemptedMove::Drop { board, .. } => *board,
        }
    }

    /// Terse coordinate text for error reporting, `e2e4` / `N@f3`.
    pub fn describe(&self) -> String {
        match self {
            AttemptedMove::Normal {
                from,
                to,
                promotion,
                ..
            } => match promotion {
                Some(role) => format!("{}{}={}", from, to, role.upper_char()),
                None => format!("{}{}", from, to),
            },
            AttemptedMove::Drop { piece, to, .. } => {
                format!("{}@{}", piece.upper_char(), to)
            }
        }
    }
}

/// A committed half-move, exactly as it was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayedMove {
    pub board: BoardId,
    /// Side that moved.
    pub side: Color,
    pub kind: PlayedKind,
    /// Notation of the move as applied, with check or mate suffix.
    pub san: String,
}

/// What a committed half-move did on its board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayedKind {
    Normal {
        from: Square,
        to: Square,
        promotion: Option<Role>,
        /// Piece kind credited to the partner reserve; already demoted
        /// to a pawn if the victim was itself a promoted piece.
        captured: Option<Role>,
        /// The capture demoted a promoted piece.
        demoted: bool,
        castle: bool,
    },
    Drop {
        piece: Role,
        to: Square,
    },
}

impl PlayedMove {
    /// True if the move handed a piece to the partner reserve.
    pub fn is_capture(&self) -> bool {
        matches!(
            self.kind,
            PlayedKind::Normal {
                captured: Some(_),
                ..
            }
        )
    }

    /// Reserve credit produced by this move, if any.
    pub fn captured(&self) -> Option<Role> {
        match self.kind {
            PlayedKind::Normal { captured, .. } => captured,
            PlayedKind::Drop { .. } => None,
        }
    }

    /// Identity used to detect "the same move again" under one tree
    /// node. Capture metadata and notation are derived from the parent
    /// position, so the coordinates alone decide sameness.
    pub fn key(&self) -> MoveKey {
        match self.kind {
            PlayedKind::Normal {
                from,
                to,
                promotion,
                ..
            } => MoveKey::Normal {
                board: self.board,
                from,
                to,
                promotion,
            },
            PlayedKind::Drop { piece, to } => MoveKey::Drop {
                board: self.board,
                piece,
                to,
            },
        }
    }
}

impl fmt::Display for PlayedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.san)
    }
}

/// Resolved-move identity: board plus coordinates, nothing derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Normal {
        board: BoardId,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    },
    Drop {
        board: BoardId,
        piece: Role,
        to: Square,
    },
}
