use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tabiya::config::{BookConfig, EngineConfig};
use tabiya::selfplay::{generate_games_with, summarize, write_jsonl, ExternalEngineSpec, PlayerKind, SelfPlayParams};

#[derive(Parser, Debug)]
#[command(name = "tabiya-selfplay", about = "Play a match between two engine settings and report the score")]
struct Args {
    #[arg(long, default_value_t = 10)]
    games: usize,
    #[arg(long, default_value_t = 200)]
    max_plies: usize,
    /// Depth of the first player
    #[arg(long, default_value_t = 3)]
    depth: u32,
    /// Depth of the second player; 0 plays uniformly random moves
    #[arg(long, default_value_t = 2)]
    opponent_depth: u32,
    /// Use this UCI engine binary as the second player instead
    #[arg(long)]
    opponent_uci: Option<String>,
    /// Extra argument for the UCI opponent; repeatable
    #[arg(long = "opponent-arg", requires = "opponent_uci")]
    opponent_args: Vec<String>,
    /// `go depth N` for the UCI opponent
    #[arg(long, requires = "opponent_uci")]
    opponent_uci_depth: Option<u32>,
    /// `go movetime N` for the UCI opponent (default 100 ms)
    #[arg(long, requires = "opponent_uci")]
    opponent_movetime: Option<u64>,
    /// Skill Level option for the UCI opponent (Stockfish: 0..20)
    #[arg(long, requires = "opponent_uci")]
    opponent_skill: Option<u32>,
    /// Let engine players consult the configured opening books
    #[arg(long)]
    book: bool,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Worker threads for running games side by side (0 = rayon default)
    #[arg(long, default_value_t = 0)]
    threads: usize,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    openings: Option<PathBuf>,
    /// Write one JSON line per game here
    #[arg(long)]
    out: Option<PathBuf>,
}

fn player(depth: u32, use_book: bool) -> PlayerKind {
    if depth == 0 { PlayerKind::Random } else { PlayerKind::Engine { depth, use_book } }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let a = Args::parse();
    let mut engine = match &a.config {
        Some(p) => EngineConfig::load(p).with_context(|| format!("load config {}", p.display()))?,
        None => EngineConfig::default(),
    };
    if !a.book { engine.book = BookConfig::disabled(); }
    if a.threads > 0 {
        rayon::ThreadPoolBuilder::new().num_threads(a.threads).build_global().context("configure thread pool")?;
    }

    let params = SelfPlayParams {
        games: a.games,
        max_plies: a.max_plies,
        seed: a.seed,
        first: player(a.depth, a.book),
        second: match &a.opponent_uci {
            Some(command) => PlayerKind::Uci(ExternalEngineSpec {
                command: command.clone(),
                args: a.opponent_args.clone(),
                depth: a.opponent_uci_depth,
                movetime_ms: a.opponent_movetime.or(if a.opponent_uci_depth.is_none() { Some(100) } else { None }),
                skill_level: a.opponent_skill,
            }),
            None => player(a.opponent_depth, a.book),
        },
        engine,
        openings_path: a.openings,
    };
    eprintln!("Playing {} games: {:?} vs {:?}", a.games, params.first, params.second);

    let pb = ProgressBar::new(a.games as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} games {msg}").context("progress template")?);
    let games = generate_games_with(&params, |g| {
        pb.set_message(format!("last: {} plies", g.moves.len()));
        pb.inc(1);
    });
    pb.finish_and_clear();
    let games = games.context("self-play")?;

    let s = summarize(&games);
    println!(
        "first: {} wins, second: {} wins, draws: {}, unfinished: {}",
        s.first_wins, s.second_wins, s.draws, s.unfinished
    );
    let fallbacks: usize = games.iter().map(|g| g.fallback_moves).sum();
    if fallbacks > 0 { eprintln!("{fallbacks} random fallback moves were played"); }
    if let Some(out) = a.out {
        write_jsonl(&games, &out).with_context(|| format!("write {}", out.display()))?;
        eprintln!("Wrote {}", out.display());
    }
    Ok(())
}
