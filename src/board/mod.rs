//! Rules-engine backends.

pub mod cozy;
#[cfg(feature = "board-pleco")]
pub mod pleco;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("FEN error in {fen:?}: {reason}")]
    Fen { fen: String, reason: String },
    #[error("illegal move: {0}")]
    IllegalMove(String),
}
