use crate::rules::{Applied, GamePosition};

// Make/unmake perft over any rules backend (no cloning at this layer)
pub fn perft<P: GamePosition>(pos: &mut P, depth: u32) -> u64 {
    if depth == 0 { return 1; }
    let moves = pos.legal_moves();
    if depth == 1 { return moves.len() as u64; }
    let mut nodes = 0u64;
    for mv in moves {
        let mut child = Applied::new(&mut *pos, mv);
        nodes += perft(&mut *child, depth - 1);
    }
    nodes
}
