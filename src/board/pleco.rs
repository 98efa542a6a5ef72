#![cfg(feature = "board-pleco")]
use pleco::{BitMove, Board as PlecoBoard, PieceType, Player, SQ};

use crate::board::PositionError;
use crate::rules::{GamePosition, PieceKind, Side};

/// pleco board driven through its native make/unmake.
pub struct RevBoard {
    board: PlecoBoard,
    stack: Vec<BitMove>,
}

impl RevBoard {
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        PlecoBoard::from_fen(fen)
            .map(|b| Self { board: b, stack: Vec::with_capacity(128) })
            .map_err(|e| PositionError::Fen { fen: fen.to_string(), reason: format!("{e:?}") })
    }
    pub fn startpos() -> Self { Self { board: PlecoBoard::start_pos(), stack: Vec::with_capacity(128) } }
    pub fn inner(&self) -> &PlecoBoard { &self.board }
}

impl GamePosition for RevBoard {
    type Move = BitMove;

    fn legal_moves(&self) -> Vec<BitMove> { self.board.generate_moves().iter().copied().collect() }

    fn is_checkmate(&self) -> bool { self.board.checkmate() }

    fn is_stalemate(&self) -> bool { self.board.stalemate() }

    fn apply(&mut self, mv: BitMove) { self.board.apply_move(mv); self.stack.push(mv); }

    fn undo(&mut self, _mv: BitMove) { if self.stack.pop().is_some() { self.board.undo_move(); } }

    fn side_to_move(&self) -> Side {
        match self.board.turn() {
            Player::White => Side::White,
            Player::Black => Side::Black,
        }
    }

    fn piece_at(&self, rank: u8, file: u8) -> Option<(PieceKind, Side)> {
        let piece = self.board.piece_at_sq(SQ(rank * 8 + file));
        let side = match piece.player()? {
            Player::White => Side::White,
            Player::Black => Side::Black,
        };
        let kind = match piece.type_of() {
            PieceType::P => PieceKind::Pawn,
            PieceType::N => PieceKind::Knight,
            PieceType::B => PieceKind::Bishop,
            PieceType::R => PieceKind::Rook,
            PieceType::Q => PieceKind::Queen,
            PieceType::K => PieceKind::King,
            _ => return None,
        };
        Some((kind, side))
    }

    // pleco only tracks moves applied since the board was built.
    fn ply(&self) -> u32 { self.board.moves_played() as u32 }

    fn legal_move_count(&self) -> usize { self.board.generate_moves().len() }
}
