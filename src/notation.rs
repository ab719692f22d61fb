//! Move-text parsing.
//!
//! Recorded games carry moves as SAN-flavored text: plain SAN for board
//! moves, the `@` form for reserve drops, and castling in both the
//! letter-O and digit-zero spellings. Parsing resolves text against the
//! position it will be played on and produces an [`AttemptedMove`];
//! legality is then the validator's business, so a parsed drop of a
//! king, say, still comes back here as a well-formed attempt.

use shakmaty::san::{SanError, SanPlus};
use shakmaty::{Chess, Position, Role, Square};

use crate::board::BoardId;
use crate::error::{MoveError, MoveResult};
use crate::moves::AttemptedMove;

/// Parses one move text against the board position it belongs to.
///
/// Check and mate suffixes are tolerated and ignored; the engine
/// re-derives them when the move is applied.
///
/// # Errors
///
/// [`MoveError::AmbiguousNotation`] when the text matches more than one
/// legal move, [`MoveError::IllegalMove`] when it matches none or does
/// not parse at all. Both carry the offending text.
pub fn parse_move_text(board: BoardId, pos: &Chess, text: &str) -> MoveResult<AttemptedMove> {
    let trimmed = text.trim();

    if let Some((piece_text, rest)) = trimmed.split_once('@') {
        let square_text = rest.trim_end_matches(|c| c == '+' || c == '#');
        let piece = match piece_text {
            "P" | "p" => Role::Pawn,
            "N" | "n" => Role::Knight,
            "B" | "b" => Role::Bishop,
            "R" | "r" => Role::Rook,
            "Q" | "q" => Role::Queen,
            "K" | "k" => Role::King,
            _ => return Err(illegal(board, trimmed)),
        };
        let to = square_text
            .parse::<Square>()
            .map_err(|_| illegal(board, trimmed))?;
        return Ok(AttemptedMove::Drop {
            board,
            side: pos.turn(),
            piece,
            to,
        });
    }

    let san_text = normalize_castle(trimmed).unwrap_or_else(|| trimmed.to_string());
    let san_plus: SanPlus = san_text.parse().map_err(|_| illegal(board, trimmed))?;
    let m = san_plus.san.to_move(pos).map_err(|err| match err {
        SanError::AmbiguousSan => MoveError::AmbiguousNotation {
            board,
            text: trimmed.to_string(),
        },
        _ => illegal(board, trimmed),
    })?;

    match m.from() {
        Some(from) => Ok(AttemptedMove::Normal {
            board,
            from,
            to: m.to(),
            promotion: m.promotion(),
        }),
        None => Err(illegal(board, trimmed)),
    }
}

/// Rewrites digit-zero castle spellings to the canonical letter-O form,
/// keeping any check or mate suffix. Returns `None` for anything that
/// is not a castle.
fn normalize_castle(text: &str) -> Option<String> {
    let core_len = text.trim_end_matches(|c| c == '+' || c == '#').len();
    let (core, suffix) = text.split_at(core_len);
    let letters = match core {
        "O-O" | "0-0" => "O-O",
        "O-O-O" | "0-0-0" => "O-O-O",
        _ => return None,
    };
    Some(format!("{letters}{suffix}"))
}

fn illegal(board: BoardId, text: &str) -> MoveError {
    MoveError::IllegalMove {
        board,
        text: text.to_string(),
    }
}
