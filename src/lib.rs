//! Bughouse replay and analysis engine.
//!
//! Bughouse is chess on two boards at once: a capture on one board hands
//! the captured piece to the capturing side's partner on the other
//! board, who may later drop it on any empty square instead of moving.
//! This crate models a whole match as one value, replays recorded games
//! move by move, and maintains an analysis tree with variations,
//! promotion and drop dialogs, and clocks reconstructed from recorded
//! timestamps.
//!
//! # Module Organization
//!
//! - [`board`] - board identity and the per-board / per-side containers
//! - [`snapshot`] - the immutable whole-match state value
//! - [`apply`] - move validation and application, reserves included
//! - [`notation`] - move text parsing, drops and castles included
//! - [`tree`] / [`nav`] - the analysis tree and cursor navigation
//! - [`session`] - the command surface a frontend drives
//! - [`replay`] - linear replay with exact undo and a capture ledger
//! - [`record`] - recorded game files and move sequencing
//!
//! # Example
//!
//! ```
//! use bughouse_analysis::{AnalysisSession, AttemptedMove, BoardId, TimeControl};
//! use shakmaty::Square;
//!
//! let mut session = AnalysisSession::new(TimeControl::default());
//! session.try_move(AttemptedMove::Normal {
//!     board: BoardId::A,
//!     from: Square::E2,
//!     to: Square::E4,
//!     promotion: None,
//! })?;
//!
//! let line = session.moves_to_cursor();
//! assert_eq!(line[0].san, "e4");
//! # Ok::<(), bughouse_analysis::SessionError>(())
//! ```

pub mod apply;
pub mod board;
pub mod clock;
pub mod error;
pub mod moves;
pub mod nav;
pub mod notation;
pub mod record;
pub mod replay;
pub mod reserve;
pub mod session;
pub mod snapshot;
pub mod tree;

pub use apply::{apply, ApplyOutcome, PROMOTION_CHOICES};
pub use board::{BoardId, PerBoard, PerSide};
pub use clock::{BoardClocks, BoardTimeline, TimeControl};
pub use error::{DropViolation, LoadError, MoveError, MoveResult, SessionError};
pub use moves::{AttemptedMove, MoveKey, PlayedKind, PlayedMove};
pub use nav::{NavState, VariationSelector};
pub use notation::parse_move_text;
pub use record::{BoardRecord, RecordedGame, SequencedMove, TimedMove};
pub use replay::{CaptureLedger, ReplayController};
pub use reserve::{piece_value, Reserve, DROPPABLE};
pub use session::{
    reduce, AnalysisSession, MoveOutcome, PendingDrop, PendingPromotion, SessionCommand,
};
pub use snapshot::PositionSnapshot;
pub use tree::{AnalysisNode, AnalysisTree, NodeId, NodeIdFactory};
