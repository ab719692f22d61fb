//! Engine error types.

use std::fmt;

use thiserror::Error;

use crate::board::BoardId;

/// Result alias for move validation and application.
pub type MoveResult<T> = Result<T, MoveError>;

/// Why an attempted half-move was rejected.
///
/// Rejection never mutates engine state; the caller can show the error
/// and carry on from the unchanged position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The rules provider found no matching legal move on that board.
    #[error("illegal move {text} on board {board}")]
    IllegalMove { board: BoardId, text: String },

    /// A drop precondition failed.
    #[error("illegal drop on board {board}: {violation}")]
    IllegalDrop {
        board: BoardId,
        violation: DropViolation,
    },

    /// Move text that parses but matches more than one legal move.
    #[error("ambiguous move {text} on board {board}")]
    AmbiguousNotation { board: BoardId, text: String },
}

/// The specific drop precondition that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropViolation {
    /// The dropping side holds none of that piece kind on this board.
    EmptyReserve,
    /// The target square is occupied.
    SquareOccupied,
    /// Kings cannot be dropped.
    KingDrop,
    /// Pawns cannot be dropped on the first or last rank.
    PawnOnEdgeRank,
    /// It is not the dropping side's turn on this board.
    OutOfTurn,
    /// The drop would leave the dropping side's own king in check.
    ExposesKing,
}

impl fmt::Display for DropViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropViolation::EmptyReserve => "no such piece in reserve",
            DropViolation::SquareOccupied => "target square is occupied",
            DropViolation::KingDrop => "kings cannot be dropped",
            DropViolation::PawnOnEdgeRank => "pawns cannot be dropped on the back ranks",
            DropViolation::OutOfTurn => "not that side's turn",
            DropViolation::ExposesKing => "own king would be left in check",
        };
        f.write_str(text)
    }
}

/// A mainline load that aborted partway through its move sequence.
///
/// The sequence index and board pin down the offending entry; the live
/// tree is untouched when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("load failed at move {index} on board {board}: {source}")]
pub struct LoadError {
    pub index: usize,
    pub board: BoardId,
    #[source]
    pub source: MoveError,
}

/// Why a session command was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// A promotion choice arrived with no promotion pending.
    #[error("no promotion is pending")]
    NoPendingPromotion,

    /// A drop target arrived with no drop selection pending.
    #[error("no drop selection is pending")]
    NoPendingDrop,

    /// The command referenced a node that is not in the tree.
    #[error("unknown node {0}")]
    UnknownNode(crate::tree::NodeId),
}
