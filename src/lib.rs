// Book-first chess move selection over a plain alpha-beta search
pub mod board;
pub mod book;
pub mod config;
pub mod perft;
pub mod rules;
pub mod search;
pub mod selector;
pub mod selfplay;
pub mod uci;

// Re-exports kept minimal
pub use rules::{GamePosition, PieceKind, Side};
pub use selector::{MoveOrigin, MoveSelector, SelectError, Selection};
