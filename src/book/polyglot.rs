//! Polyglot `.bin` opening books.
//!
//! A book is a flat array of 16-byte big-endian records sorted by key:
//! `key: u64, move: u16, weight: u16, learn: u32`. The move packs to-file,
//! to-rank, from-file and from-rank in 3-bit fields (low to high) and a
//! promotion piece in bits 12..15; castling is written as king-takes-rook.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::book::{BookEntry, BookError, BookSource, OpenBook};
use crate::rules::{GamePosition, PieceKind};

pub const RECORD_SIZE: usize = 16;

/// Positions that can be looked up in a Polyglot book.
pub trait PolyglotPosition: GamePosition {
    /// The position's Polyglot Zobrist key.
    fn polyglot_key(&self) -> Result<u64, BookError>;

    /// Backend move for a decoded book move. No legality check is implied.
    fn book_move(&self, mv: &BookMove) -> Option<Self::Move>;
}

/// A decoded Polyglot move in board coordinates (rank 0 is White's back rank).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookMove {
    pub from_file: u8,
    pub from_rank: u8,
    pub to_file: u8,
    pub to_rank: u8,
    pub promotion: Option<PieceKind>,
}

impl BookMove {
    /// `None` for an unknown promotion code.
    pub fn decode(raw: u16) -> Option<Self> {
        let field = |shift: u16| ((raw >> shift) & 0x7) as u8;
        let promotion = match field(12) {
            0 => None,
            1 => Some(PieceKind::Knight),
            2 => Some(PieceKind::Bishop),
            3 => Some(PieceKind::Rook),
            4 => Some(PieceKind::Queen),
            _ => return None,
        };
        Some(Self {
            to_file: field(0),
            to_rank: field(3),
            from_file: field(6),
            from_rank: field(9),
            promotion,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub key: u64,
    pub raw_move: u16,
    pub weight: u16,
    pub learn: u32,
}

impl Record {
    fn from_bytes(b: &[u8]) -> Self {
        let mut k = [0u8; 8];
        k.copy_from_slice(&b[0..8]);
        Self {
            key: u64::from_be_bytes(k),
            raw_move: u16::from_be_bytes([b[8], b[9]]),
            weight: u16::from_be_bytes([b[10], b[11]]),
            learn: u32::from_be_bytes([b[12], b[13], b[14], b[15]]),
        }
    }
}

/// A Polyglot file on disk. Nothing is read until [`BookSource::open`]; the
/// first successful read is kept for later lookups, and a failed one is
/// retried on the next open.
#[derive(Debug)]
pub struct PolyglotBook {
    path: PathBuf,
    name: String,
    cache: OnceLock<PolyglotReader>,
}

impl PolyglotBook {
    pub fn new<Q: Into<PathBuf>>(path: Q) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name, cache: OnceLock::new() }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn is_loaded(&self) -> bool { self.cache.get().is_some() }

    /// The cached reader, loading it first if needed.
    pub fn reader(&self) -> Result<&PolyglotReader, BookError> {
        if let Some(r) = self.cache.get() { return Ok(r); }
        let r = self.read()?;
        log::debug!("loaded book {} ({} records)", self.name, r.len());
        Ok(self.cache.get_or_init(|| r))
    }

    pub fn read(&self) -> Result<PolyglotReader, BookError> {
        let bytes = fs::read(&self.path).map_err(|source| BookError::Io { path: self.path.clone(), source })?;
        PolyglotReader::parse(&self.name, &self.path, &bytes)
    }
}

impl<P: PolyglotPosition> BookSource<P> for PolyglotBook {
    fn name(&self) -> &str { &self.name }

    fn open(&self) -> Result<Box<dyn OpenBook<P> + '_>, BookError> {
        Ok(Box::new(self.reader()?))
    }
}

/// An opened, validated book held in memory.
#[derive(Clone, Debug)]
pub struct PolyglotReader {
    name: String,
    records: Vec<Record>,
}

impl PolyglotReader {
    pub fn parse(name: &str, path: &Path, bytes: &[u8]) -> Result<Self, BookError> {
        if bytes.len() % RECORD_SIZE != 0 {
            return Err(BookError::Malformed {
                path: path.to_path_buf(),
                reason: format!("length {} is not a multiple of {RECORD_SIZE}", bytes.len()),
            });
        }
        let records: Vec<Record> = bytes.chunks_exact(RECORD_SIZE).map(Record::from_bytes).collect();
        if records.windows(2).any(|w| w[0].key > w[1].key) {
            return Err(BookError::Malformed { path: path.to_path_buf(), reason: "records are not sorted by key".into() });
        }
        Ok(Self { name: name.to_string(), records })
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// All records stored under `key`, in file order.
    pub fn entries(&self, key: u64) -> &[Record] {
        let start = self.records.partition_point(|r| r.key < key);
        let end = start + self.records[start..].partition_point(|r| r.key == key);
        &self.records[start..end]
    }

    /// Highest-weight record for `key`, ignoring zero weights. The first
    /// record wins a tie.
    pub fn best(&self, key: u64) -> Option<Record> {
        let mut best: Option<Record> = None;
        for r in self.entries(key) {
            if r.weight == 0 { continue; }
            if best.map_or(true, |b| r.weight > b.weight) { best = Some(*r); }
        }
        best
    }
}

impl<P: PolyglotPosition> OpenBook<P> for PolyglotReader {
    fn find_best_entry(&self, pos: &P) -> Result<Option<BookEntry<P::Move>>, BookError> {
        let key = pos.polyglot_key()?;
        let Some(rec) = self.best(key) else { return Ok(None) };
        let Some(decoded) = BookMove::decode(rec.raw_move) else {
            log::warn!("book {}: undecodable move {:#06x}", self.name, rec.raw_move);
            return Ok(None);
        };
        Ok(pos.book_move(&decoded).map(|mv| BookEntry { source: self.name.clone(), mv, weight: rec.weight }))
    }
}
