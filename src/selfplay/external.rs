//! A UCI engine running as a child process, used as a self-play opponent.

use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

const QUIT_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ExternalEngineError {
    #[error("cannot start engine {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("engine pipe error: {0}")]
    Io(#[from] io::Error),
    #[error("engine closed its output while waiting for {0}")]
    Closed(&'static str),
}

/// How an external engine is started and how long it may think.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEngineSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// `go depth N`; takes precedence over `movetime_ms`.
    #[serde(default)]
    pub depth: Option<u32>,
    /// `go movetime N`; used when no depth is set.
    #[serde(default)]
    pub movetime_ms: Option<u64>,
    /// Sent as `setoption name Skill Level value N` when set.
    #[serde(default)]
    pub skill_level: Option<u32>,
}

impl ExternalEngineSpec {
    fn go_command(&self) -> String {
        match (self.depth, self.movetime_ms) {
            (Some(d), _) => format!("go depth {d}"),
            (None, Some(ms)) => format!("go movetime {ms}"),
            (None, None) => "go depth 1".to_string(),
        }
    }
}

/// A running engine. Dropping it sends `quit` and kills the process if it
/// has not exited shortly after.
pub struct ExternalEngine {
    spec: ExternalEngineSpec,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ExternalEngine {
    pub fn spawn(spec: &ExternalEngineSpec) -> Result<Self, ExternalEngineError> {
        let mut child = Command::new(&spec.command)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ExternalEngineError::Spawn { command: spec.command.clone(), source })?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExternalEngineError::Closed("pipes"));
        };
        let mut engine = Self { spec: spec.clone(), child, stdin: Some(stdin), stdout: BufReader::new(stdout) };
        engine.handshake()?;
        Ok(engine)
    }

    fn handshake(&mut self) -> Result<(), ExternalEngineError> {
        self.send("uci")?;
        self.wait_for("uciok")?;
        if let Some(level) = self.spec.skill_level {
            self.send(&format!("setoption name Skill Level value {level}"))?;
        }
        self.send("isready")?;
        self.wait_for("readyok")?;
        Ok(())
    }

    fn send(&mut self, line: &str) -> Result<(), ExternalEngineError> {
        let stdin = self.stdin.as_mut().ok_or(ExternalEngineError::Closed("stdin"))?;
        writeln!(stdin, "{line}")?;
        stdin.flush()?;
        Ok(())
    }

    // Next line that starts with `prefix`; earlier lines (info, id, option) are skipped.
    fn wait_for(&mut self, prefix: &'static str) -> Result<String, ExternalEngineError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 { return Err(ExternalEngineError::Closed(prefix)); }
            let trimmed = line.trim();
            if trimmed.starts_with(prefix) { return Ok(trimmed.to_string()); }
        }
    }

    /// The engine's `bestmove` for `fen`, as a UCI string. `None` when the
    /// engine answers `(none)` or `0000`.
    pub fn best_move(&mut self, fen: &str) -> Result<Option<String>, ExternalEngineError> {
        self.send(&format!("position fen {fen}"))?;
        let go = self.spec.go_command();
        self.send(&go)?;
        let line = self.wait_for("bestmove")?;
        let mv = line.split_whitespace().nth(1).unwrap_or("(none)");
        if mv == "(none)" || mv == "0000" { return Ok(None); }
        Ok(Some(mv.to_string()))
    }
}

impl Drop for ExternalEngine {
    fn drop(&mut self) {
        let _ = self.send("quit");
        // Closing stdin also ends engines that ignore `quit`.
        self.stdin = None;
        let start = Instant::now();
        while start.elapsed() < QUIT_GRACE {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => thread::sleep(Duration::from_millis(10)),
                Err(_) => break,
            }
        }
        log::debug!("engine {} did not quit, killing it", self.spec.command);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
