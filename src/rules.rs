//! The rules-engine seam.
//!
//! Search, evaluation and book lookup never touch a concrete board type. They
//! talk to a [`GamePosition`], which any move generator can implement; the
//! crate ships a cozy-chess backend and, behind `board-pleco`, a pleco one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Closed set of piece kinds. The discriminant doubles as the row index into
/// material and piece-square tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// What the engine needs from a rules engine.
///
/// Moves are opaque tokens: the engine only ever applies values that came out
/// of [`GamePosition::legal_moves`] (or a book adapter owned by the backend).
/// `apply` and `undo` must be exact inverses.
pub trait GamePosition {
    type Move: Copy + Eq + fmt::Debug + fmt::Display;

    /// Legal moves in the backend's enumeration order. Search visits children
    /// in exactly this order.
    fn legal_moves(&self) -> Vec<Self::Move>;

    fn is_checkmate(&self) -> bool;

    fn is_stalemate(&self) -> bool;

    /// Play `mv`, which must be legal in the current position.
    fn apply(&mut self, mv: Self::Move);

    /// Take back `mv`, the most recently applied move.
    fn undo(&mut self, mv: Self::Move);

    fn is_legal(&self, mv: Self::Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    fn side_to_move(&self) -> Side;

    /// Occupant of the square at `rank`/`file` (both 0..8, rank 0 is White's
    /// back rank, file 0 is the a-file).
    fn piece_at(&self, rank: u8, file: u8) -> Option<(PieceKind, Side)>;

    /// Half-moves played since the start of the game.
    fn ply(&self) -> u32;

    fn legal_move_count(&self) -> usize {
        self.legal_moves().len()
    }
}

/// A move applied to a position for the lifetime of the guard.
///
/// Dropping the guard undoes the move, so a child visit cannot leak a played
/// move on any exit path, including an early `break` out of a sibling loop.
pub struct Applied<'a, P: GamePosition> {
    pos: &'a mut P,
    mv: P::Move,
}

impl<'a, P: GamePosition> Applied<'a, P> {
    pub fn new(pos: &'a mut P, mv: P::Move) -> Self {
        pos.apply(mv);
        Self { pos, mv }
    }

    pub fn mv(&self) -> P::Move {
        self.mv
    }
}

impl<P: GamePosition> Deref for Applied<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.pos
    }
}

impl<P: GamePosition> DerefMut for Applied<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.pos
    }
}

impl<P: GamePosition> Drop for Applied<'_, P> {
    fn drop(&mut self) {
        self.pos.undo(self.mv);
    }
}
