use serde::{Deserialize, Serialize};

use crate::rules::{GamePosition, Side};
use crate::search::pst::{MaterialValues, PieceSquareTables};

// Mate scoring helpers
pub const MATE_SCORE: i32 = 30_000;
pub const DRAW_SCORE: i32 = 0;
/// Search window bound; strictly outside every score `evaluate` can return.
pub const INFINITY: i32 = 32_000;

/// Mobility weight by game phase: `opening_weight` for the first
/// `opening_plies` half-moves, `late_weight` afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityWeights {
    pub opening_plies: u32,
    pub opening_weight: f32,
    pub late_weight: f32,
}

impl Default for MobilityWeights {
    fn default() -> Self { Self { opening_plies: 20, opening_weight: 0.1, late_weight: 0.2 } }
}

impl MobilityWeights {
    pub fn weight_at(&self, ply: u32) -> f32 {
        if ply < self.opening_plies { self.opening_weight } else { self.late_weight }
    }

    pub fn disabled() -> Self { Self { opening_plies: 0, opening_weight: 0.0, late_weight: 0.0 } }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub material: MaterialValues,
    pub pst: PieceSquareTables,
    pub mobility: MobilityWeights,
}

/// Static evaluation in centipawns from White's point of view.
///
/// Checkmate scores `-MATE_SCORE` when White is the side to move (and so the
/// side mated) and `+MATE_SCORE` otherwise; stalemate is a draw.
pub fn evaluate<P: GamePosition>(pos: &P, cfg: &EvalConfig) -> i32 {
    if pos.is_checkmate() {
        return match pos.side_to_move() {
            Side::White => -MATE_SCORE,
            Side::Black => MATE_SCORE,
        };
    }
    if pos.is_stalemate() { return DRAW_SCORE; }
    material_pst_eval(pos, cfg) + mobility_eval(pos, cfg)
}

// Material plus placement, positive when White is ahead.
pub fn material_pst_eval<P: GamePosition>(pos: &P, cfg: &EvalConfig) -> i32 {
    let mut score = 0;
    for rank in 0..8u8 {
        for file in 0..8u8 {
            if let Some((kind, side)) = pos.piece_at(rank, file) {
                let term = cfg.material.value(kind) + cfg.pst.bonus(kind, side, rank, file);
                score += if side == Side::White { term } else { -term };
            }
        }
    }
    score
}

/// Legal-move count of the side to move, weighted by game phase.
///
/// Always added, whichever side is to move; this term is not colour symmetric.
pub fn mobility_eval<P: GamePosition>(pos: &P, cfg: &EvalConfig) -> i32 {
    let weight = cfg.mobility.weight_at(pos.ply());
    if weight == 0.0 { return 0; }
    (pos.legal_move_count() as f32 * weight).round() as i32
}
