use crate::rules::{Applied, GamePosition, Side};
use crate::search::eval::{evaluate, EvalConfig, INFINITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    pub depth: u32,
    pub alpha: i32,
    pub beta: i32,
    /// White maximizes and Black minimizes; this picks the root role.
    pub maximizing: bool,
}

impl SearchParams {
    /// Full window, root role taken from the side to move.
    pub fn full_window(depth: u32, side: Side) -> Self {
        Self { depth, alpha: -INFINITY, beta: INFINITY, maximizing: side == Side::White }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult<M> {
    pub bestmove: Option<M>,
    pub score_cp: i32,
    pub nodes: u64,
}

/// Fixed-depth minimax with alpha-beta pruning.
///
/// Children are visited in the rules engine's order with no reordering, ties
/// keep the earliest move, and the result is a pure function of the position,
/// depth and window.
#[derive(Default)]
pub struct Searcher {
    eval: EvalConfig,
    pub(crate) nodes: u64,
}

impl Searcher {
    pub fn new(eval: EvalConfig) -> Self { Self { eval, nodes: 0 } }

    pub fn eval_config(&self) -> &EvalConfig { &self.eval }

    pub fn search_depth<P: GamePosition>(&mut self, pos: &mut P, depth: u32) -> SearchResult<P::Move> {
        let params = SearchParams::full_window(depth, pos.side_to_move());
        self.search_with_params(pos, params)
    }

    pub fn search_with_params<P: GamePosition>(&mut self, pos: &mut P, params: SearchParams) -> SearchResult<P::Move> {
        self.search(pos, params.depth, params.alpha, params.beta, params.maximizing)
    }

    pub fn search<P: GamePosition>(
        &mut self,
        pos: &mut P,
        depth: u32,
        alpha: i32,
        beta: i32,
        maximizing: bool,
    ) -> SearchResult<P::Move> {
        self.nodes = 0;
        let (score_cp, bestmove) = if maximizing {
            self.max_step(pos, depth, alpha, beta)
        } else {
            self.min_step(pos, depth, alpha, beta)
        };
        log::debug!("search depth {depth}: score {score_cp}, nodes {}", self.nodes);
        SearchResult { bestmove, score_cp, nodes: self.nodes }
    }

    fn max_step<P: GamePosition>(&mut self, pos: &mut P, depth: u32, mut alpha: i32, beta: i32) -> (i32, Option<P::Move>) {
        self.nodes += 1;
        if depth == 0 || pos.is_checkmate() { return (evaluate(pos, &self.eval), None); }
        let moves = pos.legal_moves();
        if moves.is_empty() { return self.childless(pos); }

        let mut val = -INFINITY;
        let mut best = None;
        for m in moves {
            let (score, _) = {
                let mut child = Applied::new(&mut *pos, m);
                self.min_step(&mut *child, depth - 1, alpha, beta)
            };
            if score > val { val = score; best = Some(m); }
            alpha = alpha.max(val);
            if alpha >= beta { break; }
        }
        (val, best)
    }

    fn min_step<P: GamePosition>(&mut self, pos: &mut P, depth: u32, alpha: i32, mut beta: i32) -> (i32, Option<P::Move>) {
        self.nodes += 1;
        if depth == 0 || pos.is_checkmate() { return (evaluate(pos, &self.eval), None); }
        let moves = pos.legal_moves();
        if moves.is_empty() { return self.childless(pos); }

        let mut val = INFINITY;
        let mut best = None;
        for m in moves {
            let (score, _) = {
                let mut child = Applied::new(&mut *pos, m);
                self.max_step(&mut *child, depth - 1, alpha, beta)
            };
            if score < val { val = score; best = Some(m); }
            beta = beta.min(val);
            if beta <= alpha { break; }
        }
        (val, best)
    }

    // A non-terminal node with nothing to play. In chess this is stalemate
    // (mate was ruled out above); a misbehaving rules engine can also land
    // here. Textbook minimax would return the untouched ±INFINITY start value
    // with no move; this deliberately scores the node statically instead, so
    // stalemate reads as a draw and the window sentinel never escapes.
    fn childless<P: GamePosition>(&self, pos: &P) -> (i32, Option<P::Move>) {
        (evaluate(pos, &self.eval), None)
    }

    pub fn nodes(&self) -> u64 { self.nodes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::cozy::Position;

    #[test]
    fn depth_zero_is_static_eval_without_move() {
        let mut pos = Position::startpos();
        let mut s = Searcher::default();
        let r = s.search_depth(&mut pos, 0);
        assert_eq!(r.bestmove, None);
        assert_eq!(r.nodes, 1);
        assert_eq!(r.score_cp, evaluate(&pos, s.eval_config()));
    }

    #[test]
    fn stalemated_root_scores_draw() {
        // Black to move, no legal moves, not in check.
        let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut s = Searcher::default();
        let r = s.search_depth(&mut pos, 3);
        assert_eq!(r.bestmove, None);
        assert_eq!(r.score_cp, 0);
    }

    #[test]
    fn childless_node_never_returns_window_sentinel() {
        let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut s = Searcher::default();
        for maximizing in [true, false] {
            for (alpha, beta) in [(-INFINITY, INFINITY), (-50, 50), (10, 20)] {
                let r = s.search(&mut pos, 2, alpha, beta, maximizing);
                assert_eq!((r.score_cp, r.bestmove), (0, None), "max={maximizing} window=({alpha},{beta})");
            }
        }
    }

    #[test]
    fn stalemating_child_scores_draw_inside_tree() {
        // Qf7 stalemates and Qf8 mates; the stalemate child is reached with depth left.
        let mut pos = Position::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
        let mut s = Searcher::default();
        let r = s.search_depth(&mut pos, 3);
        assert!(r.bestmove.is_some());
        assert_eq!(r.score_cp, crate::search::eval::MATE_SCORE);
        let mut after = pos.clone();
        after.make_move_uci("f1f7").unwrap();
        assert!(after.is_stalemate());
        assert_eq!(s.search_depth(&mut after, 2).score_cp, 0);
    }
}
