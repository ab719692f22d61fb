//! Move validation and application.
//!
//! Everything that changes a position funnels through [`apply`]:
//! interactive attempts, recorded-game replay and mainline loading all
//! share this one path, so reserve crediting, promotion bookkeeping and
//! demotion behave identically no matter where a move came from.
//!
//! Chess legality is delegated to `shakmaty`; this module owns only the
//! bughouse layer on top of it. Reserve drops have no counterpart in
//! the standard rules, so they are validated here and applied by
//! rebuilding the board through a position setup round trip.

use shakmaty::san::SanPlus;
use shakmaty::{
    CastlingMode, CastlingSide, Chess, Color, EnPassantMode, File, FromSetup, Move, Piece,
    Position, Rank, Role, Setup, Square,
};
use tracing::{debug, trace};

use crate::board::BoardId;
use crate::error::{DropViolation, MoveError, MoveResult};
use crate::moves::{AttemptedMove, PlayedKind, PlayedMove};
use crate::snapshot::PositionSnapshot;

/// Pieces a pawn may promote to.
pub const PROMOTION_CHOICES: [Role; 4] = [Role::Queen, Role::Rook, Role::Bishop, Role::Knight];

/// Result of a validated move attempt.
#[derive(Clone, Debug)]
pub enum ApplyOutcome {
    /// The move was committed and produced a fresh snapshot.
    Applied {
        snapshot: PositionSnapshot,
        played: PlayedMove,
    },
    /// A pawn reached the last rank but the attempt named no promotion
    /// piece. Nothing was applied; retry the same squares with a choice
    /// from `choices`.
    NeedsPromotion {
        board: BoardId,
        from: Square,
        to: Square,
        choices: [Role; 4],
    },
}

/// Validates one attempted half-move against a snapshot and, when it is
/// legal, applies it.
///
/// The input snapshot is never touched; a committed move comes back as
/// a new [`PositionSnapshot`] inside [`ApplyOutcome::Applied`]. Clocks
/// are copied through unchanged, because callers also use this function
/// for speculative probes that must not cost time; committed moves get
/// their clocks charged by the caller afterwards.
///
/// # Errors
///
/// [`MoveError::IllegalMove`] when no legal move matches the attempted
/// squares, and [`MoveError::IllegalDrop`] when a drop precondition
/// fails. Either way the engine state the snapshot came from is
/// unaffected.
pub fn apply(snapshot: &PositionSnapshot, attempted: &AttemptedMove) -> MoveResult<ApplyOutcome> {
    match *attempted {
        AttemptedMove::Normal {
            board,
            from,
            to,
            promotion,
        } => apply_normal(snapshot, board, from, to, promotion),
        AttemptedMove::Drop {
            board,
            side,
            piece,
            to,
        } => apply_drop(snapshot, board, side, piece, to),
    }
}

/// Source and landing square of a board move. Castling reads as the
/// king stepping to its castled square; reserve drops have no source.
fn endpoints(m: &Move) -> Option<(Square, Square)> {
    m.from().map(|from| (from, m.to()))
}

fn apply_normal(
    snapshot: &PositionSnapshot,
    board: BoardId,
    from: Square,
    to: Square,
    promotion: Option<Role>,
) -> MoveResult<ApplyOutcome> {
    let pos = &snapshot.boards[board];
    let side = pos.turn();

    let legal = pos.legal_moves();
    let candidates: Vec<Move> = legal
        .iter()
        .filter(|m| endpoints(m) == Some((from, to)))
        .cloned()
        .collect();

    if candidates.is_empty() {
        trace!(%board, %from, %to, "no legal move matches");
        return Err(illegal(board, from, to, promotion));
    }

    // A pawn reaching the last rank matches once per promotion piece.
    // Without a stated choice that is not an error, it is a question.
    if promotion.is_none() && candidates.iter().any(|m| m.is_promotion()) {
        return Ok(ApplyOutcome::NeedsPromotion {
            board,
            from,
            to,
            choices: PROMOTION_CHOICES,
        });
    }

    let resolved = match candidates.iter().find(|m| m.promotion() == promotion) {
        Some(m) => m.clone(),
        None => return Err(illegal(board, from, to, promotion)),
    };

    let captured_square = match resolved {
        Move::EnPassant { from, to } => Some(Square::from_coords(to.file(), from.rank())),
        Move::Normal {
            capture: Some(_), to, ..
        } => Some(to),
        _ => None,
    };
    let demoted =
        captured_square.map_or(false, |sq| snapshot.promoted[board].contains(sq));
    let credited = resolved.capture().map(|kind| {
        if demoted {
            Role::Pawn
        } else {
            kind
        }
    });

    let san = SanPlus::from_move(pos.clone(), &resolved).to_string();
    let next = pos
        .clone()
        .play(&resolved)
        .map_err(|_| illegal(board, from, to, promotion))?;

    // Promoted-square bookkeeping. Occupants of the touched squares
    // changed, so their marks are dropped unconditionally; the mark
    // follows a promoted piece that moved, and a fresh promotion mints
    // a new one.
    let was_promoted_mover = snapshot.promoted[board].contains(from);
    let mut promoted_squares = snapshot.promoted[board].without(from).without(to);
    if let Some(sq) = captured_square {
        promoted_squares = promoted_squares.without(sq);
    }
    if let Move::Castle { rook, .. } = resolved {
        let rook_to_file = match resolved.castling_side() {
            Some(CastlingSide::QueenSide) => File::D,
            _ => File::F,
        };
        promoted_squares = promoted_squares
            .without(rook)
            .without(Square::from_coords(rook_to_file, rook.rank()));
    }
    if resolved.is_promotion() || was_promoted_mover {
        promoted_squares = promoted_squares.with(to);
    }

    let mut result = snapshot.clone();
    result.boards[board] = next;
    result.promoted[board] = promoted_squares;
    if let Some(kind) = credited {
        // The captured piece keeps its color, and the team-mate who can
        // drop it again is the player of that color on the other board.
        result.reserves[board.partner()][!side].add(kind);
    }

    let played = PlayedMove {
        board,
        side,
        kind: PlayedKind::Normal {
            from,
            to,
            promotion: resolved.promotion(),
            captured: credited,
            demoted,
            castle: resolved.castling_side().is_some(),
        },
        san,
    };
    debug!(%board, san = %played.san, capture = ?credited, "move applied");

    Ok(ApplyOutcome::Applied {
        snapshot: result,
        played,
    })
}

fn apply_drop(
    snapshot: &PositionSnapshot,
    board: BoardId,
    side: Color,
    piece: Role,
    to: Square,
) -> MoveResult<ApplyOutcome> {
    let pos = &snapshot.boards[board];

    if piece == Role::King {
        return Err(drop_error(board, DropViolation::KingDrop));
    }
    if side != pos.turn() {
        return Err(drop_error(board, DropViolation::OutOfTurn));
    }
    if snapshot.reserves[board][side].count(piece) == 0 {
        return Err(drop_error(board, DropViolation::EmptyReserve));
    }
    if pos.board().piece_at(to).is_some() {
        return Err(drop_error(board, DropViolation::SquareOccupied));
    }
    if piece == Role::Pawn && (to.rank() == Rank::First || to.rank() == Rank::Eighth) {
        return Err(drop_error(board, DropViolation::PawnOnEdgeRank));
    }

    // The standard rules have no drop move, so the position is rebuilt
    // from its setup with the piece added and the turn passed. Setup
    // validation then rules on king safety: a position whose side to
    // move can capture the enemy king is exactly a drop that left the
    // dropper's own king in check.
    let mut setup: Setup = pos.clone().into_setup(EnPassantMode::Legal);
    setup.board.set_piece_at(to, Piece { color: side, role: piece });
    setup.turn = !side;
    setup.ep_square = None;
    setup.halfmoves = if piece == Role::Pawn {
        0
    } else {
        setup.halfmoves.saturating_add(1)
    };
    if side == Color::Black {
        setup.fullmoves = setup.fullmoves.saturating_add(1);
    }

    // Bughouse boards can legitimately exceed one set of material.
    let next = Chess::from_setup(setup, CastlingMode::Standard)
        .or_else(|err| err.ignore_too_much_material())
        .map_err(|_| drop_error(board, DropViolation::ExposesKing))?;

    let mut result = snapshot.clone();
    result.boards[board] = next;
    if !result.reserves[board][side].remove(piece) {
        return Err(drop_error(board, DropViolation::EmptyReserve));
    }
    // Dropped pieces are ordinary pieces, never promoted ones.
    result.promoted[board] = snapshot.promoted[board].without(to);

    let suffix = if result.boards[board].is_checkmate() {
        "#"
    } else if result.boards[board].is_check() {
        "+"
    } else {
        ""
    };
    let played = PlayedMove {
        board,
        side,
        kind: PlayedKind::Drop { piece, to },
        san: format!("{}@{}{}", piece.upper_char(), to, suffix),
    };
    debug!(%board, san = %played.san, "drop applied");

    Ok(ApplyOutcome::Applied {
        snapshot: result,
        played,
    })
}

fn illegal(board: BoardId, from: Square, to: Square, promotion: Option<Role>) -> MoveError {
    MoveError::IllegalMove {
        board,
        text: AttemptedMove::Normal {
            board,
            from,
            to,
            promotion,
        }
        .describe(),
    }
}

fn drop_error(board: BoardId, violation: DropViolation) -> MoveError {
    MoveError::IllegalDrop { board, violation }
}
