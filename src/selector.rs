use thiserror::Error;

use crate::book::{OpeningBook, PolyglotPosition};
use crate::config::EngineConfig;
use crate::rules::GamePosition;
use crate::search::alphabeta::Searcher;
use crate::search::eval::EvalConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("search found no move (score {score_cp})")]
    NoMove { score_cp: i32 },
    #[error("search proposed illegal move {mv}")]
    IllegalMove { mv: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOrigin {
    Book { source: String, weight: u16 },
    Search { score_cp: i32, nodes: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection<M> {
    pub mv: M,
    pub origin: MoveOrigin,
}

/// Book first, search second, and nothing illegal leaves this type.
pub struct MoveSelector<P: GamePosition> {
    depth: u32,
    searcher: Searcher,
    book: OpeningBook<P>,
}

impl<P: GamePosition> MoveSelector<P> {
    pub fn new(depth: u32, eval: EvalConfig, book: OpeningBook<P>) -> Self {
        Self { depth: depth.max(1), searcher: Searcher::new(eval), book }
    }

    /// Search only, no book.
    pub fn search_only(depth: u32, eval: EvalConfig) -> Self { Self::new(depth, eval, OpeningBook::empty()) }

    pub fn depth(&self) -> u32 { self.depth }

    pub fn set_depth(&mut self, depth: u32) { self.depth = depth.max(1); }

    pub fn book_mut(&mut self) -> &mut OpeningBook<P> { &mut self.book }

    pub fn select_move(&mut self, pos: &mut P) -> Result<Selection<P::Move>, SelectError> {
        if let Some(entry) = self.book.lookup(pos) {
            if pos.is_legal(entry.mv) {
                log::info!("book move {} from {}", entry.mv, entry.source);
                return Ok(Selection { mv: entry.mv, origin: MoveOrigin::Book { source: entry.source, weight: entry.weight } });
            }
            log::warn!("ignoring illegal book move {} from {}", entry.mv, entry.source);
        }

        let res = self.searcher.search_depth(pos, self.depth);
        match res.bestmove {
            Some(mv) if pos.is_legal(mv) => {
                log::info!("search move {mv} (score {}, nodes {})", res.score_cp, res.nodes);
                Ok(Selection { mv, origin: MoveOrigin::Search { score_cp: res.score_cp, nodes: res.nodes } })
            }
            Some(mv) => Err(SelectError::IllegalMove { mv: mv.to_string() }),
            None => Err(SelectError::NoMove { score_cp: res.score_cp }),
        }
    }
}

impl<P: PolyglotPosition + 'static> MoveSelector<P> {
    /// Depth, evaluation and Polyglot books from `cfg`.
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(cfg.depth, cfg.eval.clone(), OpeningBook::polyglot(cfg.book.paths()))
    }
}
