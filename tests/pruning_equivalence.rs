use tabiya::board::cozy::Position;
use tabiya::rules::{GamePosition, Side};
use tabiya::search::alphabeta::Searcher;
use tabiya::search::eval::{evaluate, EvalConfig, INFINITY};

// Plain minimax with the same terminal rules and tie-breaking, no pruning.
fn minimax<P: GamePosition>(
    pos: &mut P,
    depth: u32,
    maximizing: bool,
    cfg: &EvalConfig,
    nodes: &mut u64,
) -> (i32, Option<P::Move>) {
    *nodes += 1;
    if depth == 0 || pos.is_checkmate() { return (evaluate(pos, cfg), None); }
    let moves = pos.legal_moves();
    if moves.is_empty() { return (evaluate(pos, cfg), None); }
    let mut val = if maximizing { -INFINITY } else { INFINITY };
    let mut best = None;
    for m in moves {
        pos.apply(m);
        let (s, _) = minimax(pos, depth - 1, !maximizing, cfg, nodes);
        pos.undo(m);
        if (maximizing && s > val) || (!maximizing && s < val) {
            val = s;
            best = Some(m);
        }
    }
    (val, best)
}

fn check(fen: &str, depth: u32) {
    let mut pos = Position::from_fen(fen).unwrap();
    let cfg = EvalConfig::default();
    let mut brute_nodes = 0;
    let maximizing = pos.side_to_move() == Side::White;
    let (score, mv) = minimax(&mut pos, depth, maximizing, &cfg, &mut brute_nodes);

    let res = Searcher::new(cfg).search_depth(&mut pos, depth);
    assert_eq!(res.score_cp, score, "{fen} depth {depth}: score differs from plain minimax");
    assert_eq!(res.bestmove, mv, "{fen} depth {depth}: move differs from plain minimax");
    assert!(res.nodes <= brute_nodes, "{fen} depth {depth}: {} nodes > {brute_nodes}", res.nodes);
}

#[test]
fn startpos_matches_minimax() {
    for depth in 1..=3 {
        check("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", depth);
    }
}

#[test]
fn black_to_move_matches_minimax() {
    for depth in 1..=3 {
        check("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 3 3", depth);
    }
}

#[test]
fn tactical_middlegame_matches_minimax() {
    check("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 2);
}

#[test]
fn endgame_with_mates_in_tree_matches_minimax() {
    for depth in 1..=4 {
        check("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", depth);
        check("7k/8/5K2/8/8/8/8/6R1 b - - 0 1", depth);
    }
}

#[test]
fn pruning_saves_nodes_from_the_start() {
    let mut pos = Position::startpos();
    let mut brute = 0;
    minimax(&mut pos, 3, true, &EvalConfig::default(), &mut brute);
    let res = Searcher::default().search_depth(&mut pos, 3);
    assert!(res.nodes < brute, "alpha-beta visited {} of {brute} nodes", res.nodes);
}
