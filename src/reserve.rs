//! Piece reserves: captured pieces waiting to be dropped.
//!
//! Every capture in bughouse hands the captured piece to the capturing
//! team's partner on the other board. The reserve tracks how many of
//! each droppable kind a side is holding. Kings are never captured and
//! never held.

use shakmaty::Role;

/// Kinds a reserve can hold, in display order.
pub const DROPPABLE: [Role; 5] = [
    Role::Pawn,
    Role::Knight,
    Role::Bishop,
    Role::Rook,
    Role::Queen,
];

/// Conventional point value of a piece kind.
///
/// Used by the capture ledger; a promoted piece is credited at pawn
/// value because that is what it demotes to when captured.
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 1,
        Role::Knight => 3,
        Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}

/// Counts of reserve pieces held by one side on one board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reserve {
    counts: [u8; 5],
}

impl Reserve {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(role: Role) -> Option<usize> {
        DROPPABLE.iter().position(|&r| r == role)
    }

    /// Number of pieces of one kind currently held.
    pub fn count(&self, role: Role) -> u8 {
        Self::slot(role).map_or(0, |i| self.counts[i])
    }

    /// Adds one captured piece. Kings are never held; adding one is a
    /// no-op.
    pub fn add(&mut self, role: Role) {
        if let Some(i) = Self::slot(role) {
            self.counts[i] = self.counts[i].saturating_add(1);
        }
    }

    /// Removes one piece for a drop. Returns `false` if none of that
    /// kind is held, leaving the reserve unchanged.
    pub fn remove(&mut self, role: Role) -> bool {
        match Self::slot(role) {
            Some(i) if self.counts[i] > 0 => {
                self.counts[i] -= 1;
                true
            }
            _ => false,
        }
    }

    /// Total pieces held, all kinds.
    pub fn total(&self) -> u8 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Held kinds with their counts, zero-count kinds skipped.
    pub fn iter(&self) -> impl Iterator<Item = (Role, u8)> + '_ {
        DROPPABLE
            .iter()
            .zip(self.counts.iter())
            .filter(|(_, &n)| n > 0)
            .map(|(&r, &n)| (r, n))
    }
}
