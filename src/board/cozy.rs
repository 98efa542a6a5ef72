use cozy_chess::{Board as CozyBoard, Color, File, Move, Piece, Rank, Square};
use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, EnPassantMode};

use crate::board::PositionError;
use crate::book::polyglot::{BookMove, PolyglotPosition};
use crate::book::BookError;
use crate::rules::{GamePosition, PieceKind, Side};

/// cozy-chess board with an undo stack.
///
/// cozy-chess is copy-make, so `apply` keeps the previous board on a stack and
/// `undo` pops it back; the pair is an exact inverse by construction.
#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
    stack: Vec<CozyBoard>,
}

impl Position {
    pub fn startpos() -> Self {
        Self::from_board(CozyBoard::default())
    }

    pub fn from_board(board: CozyBoard) -> Self {
        Self { board, stack: Vec::with_capacity(64) }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        CozyBoard::from_fen(fen.trim(), false)
            .map(Self::from_board)
            .map_err(|e| PositionError::Fen { fen: fen.to_string(), reason: format!("{e:?}") })
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    pub fn fen(&self) -> String { format!("{}", self.board) }

    /// Resolve a UCI string against the legal moves. Castling is accepted both
    /// as king-to-destination (`e1g1`) and cozy-chess's king-takes-rook form.
    pub fn parse_uci(&self, mv_uci: &str) -> Result<Move, PositionError> {
        let mut found = None;
        self.board.generate_moves(|moves| {
            for m in moves {
                if self.to_uci(m) == mv_uci || format!("{}", m) == mv_uci { found = Some(m); break; }
            }
            found.is_some()
        });
        found.ok_or_else(|| PositionError::IllegalMove(mv_uci.to_string()))
    }

    pub fn make_move_uci(&mut self, mv_uci: &str) -> Result<(), PositionError> {
        let mv = self.parse_uci(mv_uci)?;
        self.play(mv);
        Ok(())
    }

    /// Play a legal move for good: unlike `apply`, it cannot be undone.
    pub fn play(&mut self, mv: Move) {
        self.board.play_unchecked(mv);
        self.stack.clear();
    }

    pub fn halfmove_clock(&self) -> u8 { self.board.halfmove_clock() }

    /// Standard UCI notation for `mv` in this position.
    pub fn to_uci(&self, mv: Move) -> String {
        let is_castle = self.board.piece_on(mv.from) == Some(Piece::King)
            && self.board.colors(self.board.side_to_move()).has(mv.to);
        if is_castle {
            let file = if (mv.to.file() as usize) > (mv.from.file() as usize) { File::G } else { File::C };
            return format!("{}{}", mv.from, Square::new(file, mv.from.rank()));
        }
        format!("{}", mv)
    }

    pub fn set_from_start_and_moves(moves: &[String]) -> Result<Self, PositionError> {
        let mut pos = Self::startpos();
        pos.play_uci_moves(moves)?;
        Ok(pos)
    }

    pub fn play_uci_moves(&mut self, moves: &[String]) -> Result<(), PositionError> {
        for m in moves { self.make_move_uci(m)?; }
        Ok(())
    }
}

fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

fn kind_of(piece: Piece) -> PieceKind {
    match piece {
        Piece::Pawn => PieceKind::Pawn,
        Piece::Knight => PieceKind::Knight,
        Piece::Bishop => PieceKind::Bishop,
        Piece::Rook => PieceKind::Rook,
        Piece::Queen => PieceKind::Queen,
        Piece::King => PieceKind::King,
    }
}

fn piece_of(kind: PieceKind) -> Piece {
    match kind {
        PieceKind::Pawn => Piece::Pawn,
        PieceKind::Knight => Piece::Knight,
        PieceKind::Bishop => Piece::Bishop,
        PieceKind::Rook => Piece::Rook,
        PieceKind::Queen => Piece::Queen,
        PieceKind::King => Piece::King,
    }
}

fn square(file: u8, rank: u8) -> Square {
    Square::new(File::index(file as usize), Rank::index(rank as usize))
}

impl GamePosition for Position {
    type Move = Move;

    fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        self.board.generate_moves(|ml| { moves.extend(ml); false });
        moves
    }

    fn is_checkmate(&self) -> bool {
        !self.board.checkers().is_empty() && self.legal_move_count() == 0
    }

    fn is_stalemate(&self) -> bool {
        self.board.checkers().is_empty() && self.legal_move_count() == 0
    }

    fn apply(&mut self, mv: Move) {
        self.stack.push(self.board.clone());
        self.board.play_unchecked(mv);
    }

    fn undo(&mut self, _mv: Move) {
        if let Some(prev) = self.stack.pop() { self.board = prev; }
    }

    fn is_legal(&self, mv: Move) -> bool { self.board.is_legal(mv) }

    fn side_to_move(&self) -> Side { side_of(self.board.side_to_move()) }

    fn piece_at(&self, rank: u8, file: u8) -> Option<(PieceKind, Side)> {
        let sq = square(file, rank);
        let piece = self.board.piece_on(sq)?;
        let color = self.board.color_on(sq)?;
        Some((kind_of(piece), side_of(color)))
    }

    fn ply(&self) -> u32 {
        let full = self.board.fullmove_number() as u32;
        let black = if self.board.side_to_move() == Color::Black { 1 } else { 0 };
        full.saturating_sub(1) * 2 + black
    }

    fn legal_move_count(&self) -> usize {
        let mut ct = 0usize;
        self.board.generate_moves(|moves| { ct += moves.len(); false });
        ct
    }
}

impl PolyglotPosition for Position {
    fn polyglot_key(&self) -> Result<u64, BookError> {
        let fen: Fen = self.fen().parse().map_err(|e| BookError::Key(format!("{e}")))?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| BookError::Key(format!("{e}")))?;
        let key: Zobrist64 = pos.zobrist_hash(EnPassantMode::Legal);
        Ok(key.0)
    }

    fn book_move(&self, mv: &BookMove) -> Option<Move> {
        // Polyglot spells castling as king-takes-rook, which is also cozy-chess's encoding.
        Some(Move {
            from: square(mv.from_file, mv.from_rank),
            to: square(mv.to_file, mv.to_rank),
            promotion: mv.promotion.map(piece_of),
        })
    }
}
