//! Board identity and the paired-value containers used throughout the engine.
//!
//! A bughouse match runs on two boards at once. Almost every piece of
//! engine state exists once per board, and much of it once per side on
//! top of that, so [`PerBoard`] and [`PerSide`] keep those pairs
//! together and indexable instead of scattering `_a`/`_b` fields.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// One of the two boards of a bughouse match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardId {
    A,
    B,
}

impl BoardId {
    /// Both boards, `A` first.
    pub const ALL: [BoardId; 2] = [BoardId::A, BoardId::B];

    /// The other board of the match.
    ///
    /// Captures made on one board feed the reserve on the board this
    /// returns.
    pub fn partner(self) -> BoardId {
        match self {
            BoardId::A => BoardId::B,
            BoardId::B => BoardId::A,
        }
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardId::A => write!(f, "A"),
            BoardId::B => write!(f, "B"),
        }
    }
}

/// A pair of values, one per board, indexed by [`BoardId`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerBoard<T> {
    pub a: T,
    pub b: T,
}

impl<T> PerBoard<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Builds both entries from the same constructor.
    pub fn from_fn(mut f: impl FnMut(BoardId) -> T) -> Self {
        Self {
            a: f(BoardId::A),
            b: f(BoardId::B),
        }
    }

    /// Iterates entries in board order, `A` first.
    pub fn iter(&self) -> impl Iterator<Item = (BoardId, &T)> {
        BoardId::ALL.iter().map(move |&id| (id, &self[id]))
    }
}

impl<T> Index<BoardId> for PerBoard<T> {
    type Output = T;

    fn index(&self, id: BoardId) -> &T {
        match id {
            BoardId::A => &self.a,
            BoardId::B => &self.b,
        }
    }
}

impl<T> IndexMut<BoardId> for PerBoard<T> {
    fn index_mut(&mut self, id: BoardId) -> &mut T {
        match id {
            BoardId::A => &mut self.a,
            BoardId::B => &mut self.b,
        }
    }
}

/// A pair of values, one per side, indexed by [`Color`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerSide<T> {
    pub white: T,
    pub black: T,
}

impl<T> PerSide<T> {
    pub fn new(white: T, black: T) -> Self {
        Self { white, black }
    }

    pub fn from_fn(mut f: impl FnMut(Color) -> T) -> Self {
        Self {
            white: f(Color::White),
            black: f(Color::Black),
        }
    }
}

impl<T> Index<Color> for PerSide<T> {
    type Output = T;

    fn index(&self, side: Color) -> &T {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

impl<T> IndexMut<Color> for PerSide<T> {
    fn index_mut(&mut self, side: Color) -> &mut T {
        match side {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}
