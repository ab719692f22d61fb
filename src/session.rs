//! The analysis session: one tree, one navigation state, and the
//! pending interactions layered on top.
//!
//! A session is a plain value that answers commands. Drive it either
//! through the direct methods, which report what happened, or through
//! [`reduce`], which consumes and returns the session the way a
//! reducer loop wants it. Every command is applied in full or not at
//! all; a rejected one leaves tree, cursor and clocks untouched.

use shakmaty::{Color, Role, Square};
use tracing::{debug, info, warn};

use crate::apply::{apply, ApplyOutcome};
use crate::board::{BoardId, PerBoard};
use crate::clock::{BoardClocks, TimeControl};
use crate::error::{DropViolation, MoveError, SessionError};
use crate::moves::{AttemptedMove, PlayedMove};
use crate::nav::{NavState, VariationSelector};
use crate::record::{RecordedGame, SequencedMove};
use crate::snapshot::PositionSnapshot;
use crate::tree::{AnalysisTree, NodeId, NodeIdFactory};

/// A promotion waiting on a piece choice.
///
/// Opened when a move attempt reaches the last rank without naming a
/// piece; closed by a choice, a cancel, or any other completed action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPromotion {
    pub board: BoardId,
    pub from: Square,
    pub to: Square,
    pub choices: [Role; 4],
}

/// A drop waiting on a target square: the user picked a reserve piece
/// and has not pointed at the board yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingDrop {
    pub board: BoardId,
    pub side: Color,
    pub piece: Role,
}

/// What a successful move command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move is in the tree and the cursor stands on its node.
    Committed(NodeId),
    /// Nothing was applied; a promotion piece must be chosen first.
    PromotionPending(PendingPromotion),
}

/// Commands a driving UI feeds the session.
#[derive(Clone, Debug)]
pub enum SessionCommand {
    ApplyMove(AttemptedMove),
    ChoosePromotion(Role),
    CancelPromotion,
    BeginDrop { board: BoardId, piece: Role },
    CompleteDrop { to: Square },
    CancelDrop,
    LoadMainline {
        control: TimeControl,
        moves: Vec<SequencedMove>,
    },
    SetCursor(NodeId),
    SelectNode(NodeId),
    PromoteVariation(NodeId),
    TruncateAfter(NodeId),
    TruncateFrom(NodeId),
    NavBack,
    NavForward,
    SelectorMove(i32),
    SelectorSet(usize),
    SelectorAccept,
    SelectorDismiss,
}

/// An interactive analysis session over one bughouse match.
#[derive(Clone, Debug)]
pub struct AnalysisSession {
    tree: AnalysisTree,
    nav: NavState,
    time_control: TimeControl,
    pending_promotion: Option<PendingPromotion>,
    pending_drop: Option<PendingDrop>,
}

impl AnalysisSession {
    pub fn new(control: TimeControl) -> Self {
        Self::with_ids(control, NodeIdFactory::new())
    }

    /// Like [`AnalysisSession::new`] but with an injected id factory,
    /// so tests get reproducible node ids.
    pub fn with_ids(control: TimeControl, ids: NodeIdFactory) -> Self {
        let tree = AnalysisTree::with_ids(PositionSnapshot::initial(control), ids);
        let nav = NavState::new(tree.root_id());
        Self {
            tree,
            nav,
            time_control: control,
            pending_promotion: None,
            pending_drop: None,
        }
    }

    pub fn tree(&self) -> &AnalysisTree {
        &self.tree
    }

    pub fn nav(&self) -> &NavState {
        &self.nav
    }

    pub fn time_control(&self) -> TimeControl {
        self.time_control
    }

    pub fn cursor(&self) -> NodeId {
        self.nav.cursor()
    }

    /// Snapshot under the cursor.
    pub fn cursor_position(&self) -> &PositionSnapshot {
        self.tree
            .position(self.nav.cursor())
            .unwrap_or_else(|| self.tree.root_position())
    }

    /// Moves leading from the start of the game to the cursor.
    pub fn moves_to_cursor(&self) -> Vec<PlayedMove> {
        self.tree.moves_from_root(self.nav.cursor())
    }

    /// Clock values to display, read at the anchor node rather than the
    /// cursor so that browsing variations does not invent time.
    pub fn displayed_clocks(&self) -> PerBoard<BoardClocks> {
        let snapshot = self
            .tree
            .position(self.nav.clock_anchor())
            .unwrap_or_else(|| self.tree.root_position());
        PerBoard::from_fn(|id| snapshot.clocks(id))
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn pending_drop(&self) -> Option<PendingDrop> {
        self.pending_drop
    }

    pub fn selector(&self) -> Option<VariationSelector> {
        self.nav.selector()
    }

    /// Validates a half-move against the cursor position and commits it
    /// to the tree.
    ///
    /// Replaying a move that already hangs under the cursor advances
    /// into the existing child instead of growing a twin, so repeating
    /// a known line never changes the tree shape. A new move becomes
    /// the main child if it is the first, a variation otherwise.
    pub fn try_move(&mut self, attempted: AttemptedMove) -> Result<MoveOutcome, SessionError> {
        let cursor = self.nav.cursor();
        let position = self
            .tree
            .position(cursor)
            .ok_or(SessionError::UnknownNode(cursor))?;
        match apply(position, &attempted)? {
            ApplyOutcome::NeedsPromotion {
                board,
                from,
                to,
                choices,
            } => {
                let pending = PendingPromotion {
                    board,
                    from,
                    to,
                    choices,
                };
                // only one dialog at a time
                self.pending_drop = None;
                self.pending_promotion = Some(pending);
                debug!(%board, %from, %to, "promotion choice required");
                Ok(MoveOutcome::PromotionPending(pending))
            }
            ApplyOutcome::Applied { snapshot, played } => {
                let node = match self.tree.child_matching(cursor, played.key()) {
                    Some(existing) => existing,
                    None => self
                        .tree
                        .add_child(cursor, played, snapshot)
                        .ok_or(SessionError::UnknownNode(cursor))?,
                };
                self.nav.place(&self.tree, node);
                self.clear_pending();
                Ok(MoveOutcome::Committed(node))
            }
        }
    }

    /// Completes a pending promotion with the chosen piece.
    ///
    /// An out-of-range choice is rejected and the promotion stays
    /// pending; cancel it to walk away.
    pub fn choose_promotion(&mut self, piece: Role) -> Result<MoveOutcome, SessionError> {
        let Some(pending) = self.pending_promotion else {
            return Err(SessionError::NoPendingPromotion);
        };
        if !pending.choices.contains(&piece) {
            return Err(MoveError::IllegalMove {
                board: pending.board,
                text: format!("{}{}={}", pending.from, pending.to, piece.upper_char()),
            }
            .into());
        }
        self.try_move(AttemptedMove::Normal {
            board: pending.board,
            from: pending.from,
            to: pending.to,
            promotion: Some(piece),
        })
    }

    /// Drops the pending promotion without applying anything.
    pub fn cancel_promotion(&mut self) -> bool {
        self.pending_promotion.take().is_some()
    }

    /// Starts a drop: picks a reserve piece that now waits for a target
    /// square. Fails up front if the cursor position has none of that
    /// piece in the reserve of the side to move.
    pub fn begin_drop(&mut self, board: BoardId, piece: Role) -> Result<(), SessionError> {
        if piece == Role::King {
            return Err(MoveError::IllegalDrop {
                board,
                violation: DropViolation::KingDrop,
            }
            .into());
        }
        let position = self.cursor_position();
        let side = position.turn(board);
        if position.reserve(board, side).count(piece) == 0 {
            return Err(MoveError::IllegalDrop {
                board,
                violation: DropViolation::EmptyReserve,
            }
            .into());
        }
        self.pending_promotion = None;
        self.pending_drop = Some(PendingDrop { board, side, piece });
        debug!(%board, piece = ?piece, "drop selection started");
        Ok(())
    }

    /// Completes the pending drop on a target square. On rejection the
    /// selection stays pending, so the user can point somewhere else.
    pub fn complete_drop(&mut self, to: Square) -> Result<MoveOutcome, SessionError> {
        let Some(pending) = self.pending_drop else {
            return Err(SessionError::NoPendingDrop);
        };
        self.try_move(AttemptedMove::Drop {
            board: pending.board,
            side: pending.side,
            piece: pending.piece,
            to,
        })
    }

    /// Drops the pending drop selection.
    pub fn cancel_drop(&mut self) -> bool {
        self.pending_drop.take().is_some()
    }

    /// Replaces the whole tree with a mainline rebuilt from a recorded
    /// game.
    pub fn load_game(&mut self, game: &RecordedGame) -> Result<usize, SessionError> {
        let moves = game.combined();
        self.load_mainline(game.time_control, &moves)
    }

    /// Replaces the whole tree with a mainline rebuilt from a combined
    /// move sequence, leaving the cursor on the final position.
    ///
    /// The new tree is built completely off to the side first: a
    /// sequence that fails partway reports the failing index and leaves
    /// the session exactly as it was.
    pub fn load_mainline(
        &mut self,
        control: TimeControl,
        moves: &[SequencedMove],
    ) -> Result<usize, SessionError> {
        let ids = self.tree.fork_ids();
        let tree = AnalysisTree::build_mainline(control, moves, ids)?;
        let tip = tree.mainline_tip();
        self.tree = tree;
        self.time_control = control;
        self.nav = NavState::new(self.tree.root_id());
        self.nav.place(&self.tree, tip);
        self.clear_pending();
        info!(moves = moves.len(), "mainline loaded");
        Ok(moves.len())
    }

    /// Jumps cursor and selection to an arbitrary node.
    pub fn set_cursor(&mut self, id: NodeId) -> Result<(), SessionError> {
        if !self.tree.contains(id) {
            return Err(SessionError::UnknownNode(id));
        }
        self.nav.place(&self.tree, id);
        self.clear_pending();
        Ok(())
    }

    /// Highlights a node for editing without moving the cursor.
    pub fn select_node(&mut self, id: NodeId) -> Result<(), SessionError> {
        if !self.nav.select(&self.tree, id) {
            return Err(SessionError::UnknownNode(id));
        }
        Ok(())
    }

    /// Makes a node the main child of its parent, pulling its line onto
    /// the mainline one level up.
    pub fn promote_variation(&mut self, id: NodeId) -> Result<(), SessionError> {
        if !self.tree.contains(id) {
            return Err(SessionError::UnknownNode(id));
        }
        self.tree.promote_to_main(id);
        // the mainline changed shape, so re-derive the clock anchor
        self.nav.reanchor(&self.tree);
        Ok(())
    }

    /// Deletes everything below a node, leaving it a leaf. Cursor and
    /// selection move to it when the deletion orphaned them; otherwise
    /// they stay put. Returns the number of nodes removed.
    pub fn truncate_after(&mut self, id: NodeId) -> Result<usize, SessionError> {
        if !self.tree.contains(id) {
            return Err(SessionError::UnknownNode(id));
        }
        let removed = self.tree.remove_descendants(id);
        self.resettle(id);
        debug!(node = %id, removed, "descendants removed");
        Ok(removed)
    }

    /// Deletes a node and everything below it. Cursor and selection
    /// move to its parent when the deletion orphaned them. Aimed at the
    /// root this clears the game back to its starting position instead;
    /// the root itself is never removable. Returns the number of nodes
    /// removed.
    pub fn truncate_from(&mut self, id: NodeId) -> Result<usize, SessionError> {
        if !self.tree.contains(id) {
            return Err(SessionError::UnknownNode(id));
        }
        let (landing, removed) = match self.tree.parent(id) {
            Some(parent) => (parent, self.tree.remove_subtree(id)),
            None => (id, self.tree.remove_descendants(id)),
        };
        self.resettle(landing);
        debug!(node = %id, removed, "subtree removed");
        Ok(removed)
    }

    /// Repairs navigation after a truncation: cursor and selection land
    /// on `landing` only if the nodes they pointed at were removed.
    fn resettle(&mut self, landing: NodeId) {
        let selected = self.nav.selected();
        if !self.tree.contains(self.nav.cursor()) {
            self.nav.place(&self.tree, landing);
            // place drags the selection along; a surviving one goes back
            if self.tree.contains(selected) {
                self.nav.select(&self.tree, selected);
            }
        } else if !self.tree.contains(selected) {
            self.nav.select(&self.tree, landing);
        }
        self.nav.heal(&self.tree);
        self.clear_pending();
    }

    /// Steps the cursor to its parent, or cancels an open variation
    /// selector without moving.
    pub fn nav_back(&mut self) -> bool {
        let moved = self.nav.back(&self.tree);
        if moved {
            self.clear_pending();
        }
        moved
    }

    /// Steps the cursor forward, opening the variation selector at
    /// branch points.
    pub fn nav_forward(&mut self) -> bool {
        let moved = self.nav.forward(&self.tree);
        if moved {
            self.clear_pending();
        }
        moved
    }

    pub fn selector_move(&mut self, delta: i32) -> bool {
        self.nav.selector_move(&self.tree, delta)
    }

    pub fn selector_set(&mut self, index: usize) -> bool {
        self.nav.selector_set(&self.tree, index)
    }

    pub fn selector_accept(&mut self) -> bool {
        let moved = self.nav.accept(&self.tree);
        if moved {
            self.clear_pending();
        }
        moved
    }

    pub fn selector_dismiss(&mut self) -> bool {
        self.nav.dismiss()
    }

    /// Runs one command. A rejected command leaves the session exactly
    /// as it was.
    pub fn execute(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::ApplyMove(attempted) => self.try_move(attempted).map(|_| ()),
            SessionCommand::ChoosePromotion(piece) => self.choose_promotion(piece).map(|_| ()),
            SessionCommand::CancelPromotion => {
                self.cancel_promotion();
                Ok(())
            }
            SessionCommand::BeginDrop { board, piece } => self.begin_drop(board, piece),
            SessionCommand::CompleteDrop { to } => self.complete_drop(to).map(|_| ()),
            SessionCommand::CancelDrop => {
                self.cancel_drop();
                Ok(())
            }
            SessionCommand::LoadMainline { control, moves } => {
                self.load_mainline(control, &moves).map(|_| ())
            }
            SessionCommand::SetCursor(id) => self.set_cursor(id),
            SessionCommand::SelectNode(id) => self.select_node(id),
            SessionCommand::PromoteVariation(id) => self.promote_variation(id),
            SessionCommand::TruncateAfter(id) => self.truncate_after(id).map(|_| ()),
            SessionCommand::TruncateFrom(id) => self.truncate_from(id).map(|_| ()),
            SessionCommand::NavBack => {
                self.nav_back();
                Ok(())
            }
            SessionCommand::NavForward => {
                self.nav_forward();
                Ok(())
            }
            SessionCommand::SelectorMove(delta) => {
                self.selector_move(delta);
                Ok(())
            }
            SessionCommand::SelectorSet(index) => {
                self.selector_set(index);
                Ok(())
            }
            SessionCommand::SelectorAccept => {
                self.selector_accept();
                Ok(())
            }
            SessionCommand::SelectorDismiss => {
                self.selector_dismiss();
                Ok(())
            }
        }
    }

    fn clear_pending(&mut self) {
        self.pending_promotion = None;
        self.pending_drop = None;
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(TimeControl::default())
    }
}

/// Reducer-style dispatch: consumes the session, runs one command,
/// hands the session back. A rejected command is logged and reduces to
/// the unchanged state, which is exactly what a fold over a command
/// stream wants.
pub fn reduce(mut session: AnalysisSession, command: SessionCommand) -> AnalysisSession {
    if let Err(err) = session.execute(command) {
        warn!(%err, "command rejected");
    }
    session
}
