use std::io::{self, BufRead, Write};

use crate::board::cozy::Position;
use crate::config::EngineConfig;
use crate::rules::{GamePosition, Side};
use crate::search::eval::MATE_SCORE;
use crate::selector::{MoveOrigin, MoveSelector};

// Mate distance is not tracked, so a mate is reported with its sign only.
fn uci_score(cp: i32) -> String {
    if cp >= MATE_SCORE {
        "mate 1".to_string()
    } else if cp <= -MATE_SCORE {
        "mate -1".to_string()
    } else {
        format!("cp {cp}")
    }
}

pub struct UciEngine {
    pos: Position,
    selector: MoveSelector<Position>,
}

impl UciEngine {
    pub fn new(cfg: &EngineConfig) -> Self { Self::with_selector(MoveSelector::from_config(cfg)) }

    pub fn with_selector(selector: MoveSelector<Position>) -> Self { Self { pos: Position::startpos(), selector } }

    pub fn position(&self) -> &Position { &self.pos }

    fn cmd_uci(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "id name Tabiya")?;
        writeln!(out, "id author Tabiya Team")?;
        writeln!(out, "option name Depth type spin default {} min 1 max 16", self.selector.depth())?;
        writeln!(out, "uciok")
    }

    fn cmd_isready(&self, out: &mut dyn Write) -> io::Result<()> { writeln!(out, "readyok") }

    fn cmd_ucinewgame(&mut self) { self.pos = Position::startpos(); }

    fn cmd_setoption(&mut self, args: &str) {
        // setoption name Depth value N
        let mut tokens = args.split_whitespace();
        if tokens.next() != Some("name") { return; }
        let name = tokens.next().unwrap_or_default();
        if tokens.next() != Some("value") { return; }
        if name.eq_ignore_ascii_case("depth") {
            if let Some(d) = tokens.next().and_then(|s| s.parse::<u32>().ok()) { self.selector.set_depth(d); }
        }
    }

    fn cmd_position(&mut self, args: &str) {
        // Supports: 'position startpos [moves ...]' and 'position fen <fen> [moves ...]'
        let mut tokens = args.split_whitespace();
        let mut pos = match tokens.next() {
            Some("startpos") => Position::startpos(),
            Some("fen") => {
                let fen_fields: Vec<&str> = tokens.by_ref().take_while(|t| *t != "moves").collect();
                match Position::from_fen(&fen_fields.join(" ")) {
                    Ok(p) => p,
                    Err(e) => { log::warn!("{e}"); return; }
                }
            }
            _ => return,
        };
        let moves: Vec<String> = tokens.filter(|t| *t != "moves").map(|s| s.to_string()).collect();
        if let Err(e) = pos.play_uci_moves(&moves) {
            log::warn!("{e}");
            return;
        }
        self.pos = pos;
    }

    fn cmd_go(&mut self, args: &str, out: &mut dyn Write) -> io::Result<()> {
        // Support minimal: go depth N (anything else uses the configured depth)
        let configured = self.selector.depth();
        let mut tokens = args.split_whitespace();
        while let Some(tok) = tokens.next() {
            if tok == "depth" {
                if let Some(d) = tokens.next().and_then(|s| s.parse::<u32>().ok()) { self.selector.set_depth(d); }
            }
        }
        let res = self.selector.select_move(&mut self.pos);
        let depth = self.selector.depth();
        self.selector.set_depth(configured);
        match res {
            Ok(sel) => {
                if let MoveOrigin::Search { score_cp, nodes } = sel.origin {
                    // UCI scores are from the mover's point of view
                    let cp = if self.pos.side_to_move() == Side::White { score_cp } else { -score_cp };
                    writeln!(out, "info depth {depth} score {} nodes {nodes}", uci_score(cp))?;
                }
                writeln!(out, "bestmove {}", self.pos.to_uci(sel.mv))
            }
            Err(e) => {
                log::warn!("{e}");
                writeln!(out, "bestmove 0000")
            }
        }
    }

    /// Handle one command line. Returns `false` on `quit`.
    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<bool> {
        let line = line.trim();
        match line {
            "" => {}
            "uci" => self.cmd_uci(out)?,
            "isready" => self.cmd_isready(out)?,
            "ucinewgame" => self.cmd_ucinewgame(),
            "quit" => return Ok(false),
            "stop" => {}
            "go" => self.cmd_go("", out)?,
            _ => {
                if let Some(rest) = line.strip_prefix("position ") {
                    self.cmd_position(rest);
                } else if let Some(rest) = line.strip_prefix("go ") {
                    self.cmd_go(rest, out)?;
                } else if let Some(rest) = line.strip_prefix("setoption ") {
                    self.cmd_setoption(rest);
                } else {
                    log::debug!("ignoring unknown command: {line}");
                }
            }
        }
        out.flush()?;
        Ok(true)
    }

    pub fn run_loop(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in stdin.lock().lines() {
            let line = line?;
            if !self.handle_line(&line, &mut out)? { break; }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_sentinel_is_reported_as_mate() {
        assert_eq!(uci_score(MATE_SCORE), "mate 1");
        assert_eq!(uci_score(-MATE_SCORE), "mate -1");
        assert_eq!(uci_score(MATE_SCORE - 1), format!("cp {}", MATE_SCORE - 1));
        assert_eq!(uci_score(-35), "cp -35");
    }
}
