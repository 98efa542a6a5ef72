//! Engine-vs-engine (or engine-vs-random, or engine-vs-external-UCI) matches
//! for judging a configuration.
//!
//! Each game owns its own position, selectors and child processes, so games
//! run in parallel on rayon while every search stays single-threaded. A game
//! against built-in players is reproducible from `(seed, index)`.

pub mod external;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::board::cozy::Position;
use crate::book::{OpeningBook, ShuffledOrder};
use crate::config::EngineConfig;
use crate::rules::{GamePosition, Side};
use crate::selector::MoveSelector;
pub use external::{ExternalEngine, ExternalEngineError, ExternalEngineSpec};

// 75-move rule, in half-moves
const AUTO_DRAW_HALFMOVES: u8 = 150;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    Engine { depth: u32, use_book: bool },
    Random,
    /// A UCI engine started as a child process for each game.
    Uci(ExternalEngineSpec),
}

#[derive(Clone, Debug)]
pub struct SelfPlayParams {
    pub games: usize,
    pub max_plies: usize,
    pub seed: u64,
    pub first: PlayerKind,
    pub second: PlayerKind,
    /// Evaluation and book settings shared by every engine player.
    pub engine: EngineConfig,
    pub openings_path: Option<PathBuf>, // optional path to FEN list (one per line)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub index: usize,
    pub start_fen: String,
    pub first_is_white: bool,
    pub moves: Vec<String>,
    pub result: i8, // 1 white win, 0 draw, -1 black win
    pub finished: bool,
    /// Moves played at random because an engine could not select one.
    pub fallback_moves: usize,
}

impl GameRecord {
    /// Result from the first player's point of view.
    pub fn first_score(&self) -> i8 {
        if self.first_is_white { self.result } else { -self.result }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
    pub unfinished: usize,
}

pub fn summarize(games: &[GameRecord]) -> MatchSummary {
    let mut s = MatchSummary::default();
    for g in games {
        if !g.finished { s.unfinished += 1; continue; }
        match g.first_score() {
            1 => s.first_wins += 1,
            -1 => s.second_wins += 1,
            _ => s.draws += 1,
        }
    }
    s
}

pub fn generate_games(params: &SelfPlayParams) -> Result<Vec<GameRecord>, ExternalEngineError> {
    generate_games_with(params, |_| {})
}

/// Play every game, calling `on_game` as each one finishes (in any order).
/// The returned records are in game-index order. Fails only when an external
/// engine cannot be started.
pub fn generate_games_with<F>(params: &SelfPlayParams, on_game: F) -> Result<Vec<GameRecord>, ExternalEngineError>
where
    F: Fn(&GameRecord) + Sync,
{
    let openings = load_openings(params);
    (0..params.games)
        .into_par_iter()
        .map(|gi| {
            // Each opening is played twice so both sides get both colours.
            let start = if openings.is_empty() { None } else { Some(&openings[(gi / 2) % openings.len()]) };
            let g = play_game(params, gi, start)?;
            on_game(&g);
            Ok(g)
        })
        .collect()
}

enum Player {
    Engine(MoveSelector<Position>),
    External(ExternalEngine),
    Random,
}

fn make_player(kind: &PlayerKind, cfg: &EngineConfig, seed: u64) -> Result<Player, ExternalEngineError> {
    Ok(match kind {
        PlayerKind::Random => Player::Random,
        PlayerKind::Uci(spec) => Player::External(ExternalEngine::spawn(spec)?),
        PlayerKind::Engine { depth, use_book } => {
            let book = if *use_book {
                OpeningBook::polyglot(cfg.book.paths()).with_order(ShuffledOrder::seeded(seed))
            } else {
                OpeningBook::empty()
            };
            Player::Engine(MoveSelector::new(*depth, cfg.eval.clone(), book))
        }
    })
}

impl Player {
    // `None` hands the move to the random fallback.
    fn choose(&mut self, pos: &mut Position, index: usize) -> Option<cozy_chess::Move> {
        match self {
            Player::Random => None,
            Player::Engine(selector) => match selector.select_move(pos) {
                Ok(sel) => Some(sel.mv),
                Err(e) => {
                    log::warn!("game {index}: {e}; playing a random move");
                    None
                }
            },
            Player::External(engine) => match engine.best_move(&pos.fen()) {
                Ok(Some(uci)) => match pos.parse_uci(&uci) {
                    Ok(mv) => Some(mv),
                    Err(e) => {
                        log::warn!("game {index}: external engine sent {e}; playing a random move");
                        None
                    }
                },
                Ok(None) => {
                    log::warn!("game {index}: external engine has no move; playing a random move");
                    None
                }
                Err(e) => {
                    log::warn!("game {index}: {e}; playing a random move");
                    None
                }
            },
        }
    }
}

fn random_move(pos: &Position, rng: &mut SmallRng) -> Option<cozy_chess::Move> {
    let moves = pos.legal_moves();
    if moves.is_empty() { None } else { Some(moves[rng.gen_range(0..moves.len())]) }
}

/// Play one game. External engines are started here and shut down when the
/// game ends, whichever way it ends.
pub fn play_game(
    params: &SelfPlayParams,
    index: usize,
    start: Option<&Position>,
) -> Result<GameRecord, ExternalEngineError> {
    let game_seed = params.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut rng = SmallRng::seed_from_u64(game_seed);
    let mut first = make_player(&params.first, &params.engine, game_seed)?;
    let mut second = make_player(&params.second, &params.engine, game_seed.rotate_left(17))?;

    let mut pos = start.cloned().unwrap_or_else(Position::startpos);
    let first_is_white = index % 2 == 0;
    let mut record = GameRecord {
        index,
        start_fen: pos.fen(),
        first_is_white,
        moves: Vec::new(),
        result: 0,
        finished: false,
        fallback_moves: 0,
    };

    loop {
        if pos.is_checkmate() {
            record.result = if pos.side_to_move() == Side::White { -1 } else { 1 };
            record.finished = true;
            break;
        }
        if pos.is_stalemate() || pos.halfmove_clock() >= AUTO_DRAW_HALFMOVES {
            record.finished = true;
            break;
        }
        if record.moves.len() >= params.max_plies { break; }

        let white_to_move = pos.side_to_move() == Side::White;
        let player = if white_to_move == first_is_white { &mut first } else { &mut second };
        let mv = match player.choose(&mut pos, index) {
            Some(mv) => Some(mv),
            None => {
                if !matches!(player, Player::Random) { record.fallback_moves += 1; }
                random_move(&pos, &mut rng)
            }
        };
        let Some(mv) = mv else { break };
        record.moves.push(pos.to_uci(mv));
        pos.play(mv);
    }
    Ok(record)
}

fn load_openings(params: &SelfPlayParams) -> Vec<Position> {
    let mut out = Vec::new();
    if let Some(ref p) = params.openings_path {
        if let Ok(mut f) = File::open(p) {
            let mut s = String::new();
            if f.read_to_string(&mut s).is_ok() {
                for line in s.lines() {
                    let raw = line.trim();
                    if raw.is_empty() || raw.starts_with('#') { continue; }
                    // Support EPD (4 fields) by padding halfmove/fullmove
                    let parts: Vec<&str> = raw.split_whitespace().collect();
                    let fen = if parts.len() >= 6 {
                        parts[0..6].join(" ")
                    } else if parts.len() >= 4 {
                        let mut v = parts[0..4].to_vec();
                        v.push("0"); v.push("1"); v.join(" ")
                    } else { raw.to_string() };
                    match Position::from_fen(&fen) {
                        Ok(pos) => out.push(pos),
                        Err(e) => log::warn!("skipping opening: {e}"),
                    }
                }
            }
        } else {
            log::warn!("cannot open openings file {}", p.display());
        }
    }
    out
}

/// One JSON object per game.
pub fn write_jsonl<P: AsRef<Path>>(games: &[GameRecord], path: P) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for g in games {
        serde_json::to_writer(&mut w, g)?;
        w.write_all(b"\n")?;
    }
    w.flush()
}
