//! Opening book lookup.
//!
//! A book is a list of independently openable sources. Each lookup walks the
//! sources in an order chosen by a [`SourceOrder`] strategy and returns the
//! first hit; a source that fails to open or to answer is logged and skipped.

pub mod polyglot;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::rules::GamePosition;
pub use polyglot::{PolyglotBook, PolyglotPosition};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("cannot read book {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed book {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("cannot hash position: {0}")]
    Key(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookEntry<M> {
    pub source: String,
    pub mv: M,
    pub weight: u16,
}

/// An opened book that can answer queries.
pub trait OpenBook<P: GamePosition> {
    /// Strongest entry for `pos`, or `None` when the book does not know it.
    fn find_best_entry(&self, pos: &P) -> Result<Option<BookEntry<P::Move>>, BookError>;
}

impl<P: GamePosition, B: OpenBook<P> + ?Sized> OpenBook<P> for &B {
    fn find_best_entry(&self, pos: &P) -> Result<Option<BookEntry<P::Move>>, BookError> {
        (**self).find_best_entry(pos)
    }
}

/// A named, openable book source. Opening may fail; callers treat that as a
/// per-source problem.
pub trait BookSource<P: GamePosition> {
    fn name(&self) -> &str;
    fn open(&self) -> Result<Box<dyn OpenBook<P> + '_>, BookError>;
}

/// Chooses the order in which sources are tried.
pub trait SourceOrder {
    /// A permutation of `0..len`.
    fn order(&mut self, len: usize) -> Vec<usize>;
}

/// Sources in the order they were configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclaredOrder;

impl SourceOrder for DeclaredOrder {
    fn order(&mut self, len: usize) -> Vec<usize> { (0..len).collect() }
}

/// A fresh random permutation per lookup.
#[derive(Clone, Debug)]
pub struct ShuffledOrder {
    rng: SmallRng,
}

impl ShuffledOrder {
    pub fn from_entropy() -> Self { Self { rng: SmallRng::from_entropy() } }
    pub fn seeded(seed: u64) -> Self { Self { rng: SmallRng::seed_from_u64(seed) } }
}

impl Default for ShuffledOrder {
    fn default() -> Self { Self::from_entropy() }
}

impl SourceOrder for ShuffledOrder {
    fn order(&mut self, len: usize) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..len).collect();
        idx.shuffle(&mut self.rng);
        idx
    }
}

/// First hit across `sources`, tried in the order `order` picks. Never fails:
/// unreadable sources are skipped and a total miss is `None`. The move is not
/// checked for legality.
pub fn lookup_book_move<P: GamePosition>(
    pos: &P,
    sources: &[Box<dyn BookSource<P>>],
    order: &mut dyn SourceOrder,
) -> Option<BookEntry<P::Move>> {
    for i in order.order(sources.len()) {
        let Some(source) = sources.get(i) else { continue };
        let book = match source.open() {
            Ok(b) => b,
            Err(e) => {
                log::warn!("skipping book {}: {e}", source.name());
                continue;
            }
        };
        match book.find_best_entry(pos) {
            Ok(Some(entry)) => return Some(entry),
            Ok(None) => {}
            Err(e) => log::warn!("skipping book {}: {e}", source.name()),
        }
    }
    log::debug!("no book move in {} sources", sources.len());
    None
}

/// The configured sources together with their ordering strategy.
pub struct OpeningBook<P: GamePosition> {
    sources: Vec<Box<dyn BookSource<P>>>,
    order: Box<dyn SourceOrder>,
}

impl<P: GamePosition> OpeningBook<P> {
    pub fn new(sources: Vec<Box<dyn BookSource<P>>>) -> Self {
        Self { sources, order: Box::new(ShuffledOrder::from_entropy()) }
    }

    pub fn empty() -> Self { Self::new(Vec::new()) }

    pub fn with_order(mut self, order: impl SourceOrder + 'static) -> Self {
        self.order = Box::new(order);
        self
    }

    pub fn push(&mut self, source: Box<dyn BookSource<P>>) { self.sources.push(source); }

    pub fn len(&self) -> usize { self.sources.len() }

    pub fn is_empty(&self) -> bool { self.sources.is_empty() }

    pub fn lookup(&mut self, pos: &P) -> Option<BookEntry<P::Move>> {
        if self.sources.is_empty() { return None; }
        lookup_book_move(pos, &self.sources, self.order.as_mut())
    }
}

impl<P: PolyglotPosition + 'static> OpeningBook<P> {
    /// One Polyglot source per path, in the given order.
    pub fn polyglot<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
        let sources = paths
            .into_iter()
            .map(|p| Box::new(PolyglotBook::new(p)) as Box<dyn BookSource<P>>)
            .collect();
        Self::new(sources)
    }
}
