use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tabiya::board::cozy::Position;
use tabiya::config::{BookConfig, EngineConfig};
use tabiya::selector::{MoveOrigin, MoveSelector};
use tabiya::uci::UciEngine;

#[derive(Parser, Debug)]
#[command(author, version, about = "Book-first alpha-beta chess engine", long_about = None)]
struct Args {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct EngineArgs {
    /// JSON engine configuration (depth, evaluation tables, books)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Search depth in plies; overrides the config file
    #[arg(long, global = true)]
    depth: Option<u32>,

    /// Polyglot book file; repeatable, replaces the configured list
    #[arg(long = "book", global = true)]
    books: Vec<PathBuf>,

    /// Ignore all opening books
    #[arg(long, global = true)]
    no_book: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Speak UCI on stdin/stdout
    Uci,
    /// Print the move the engine selects for one position
    Bestmove {
        /// Starting FEN position (defaults to the initial position)
        #[arg(long)]
        fen: Option<String>,

        /// UCI moves to play from the starting position first
        #[arg(long, num_args = 1..)]
        moves: Vec<String>,
    },
}

fn engine_config(a: &EngineArgs) -> Result<EngineConfig> {
    let mut cfg = match &a.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(d) = a.depth { cfg.depth = d; }
    if !a.books.is_empty() { cfg.book = BookConfig { directory: None, files: a.books.clone() }; }
    if a.no_book { cfg.book = BookConfig::disabled(); }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = engine_config(&args.engine)?;
    log::debug!("engine config: depth {}, {} book(s)", cfg.depth, cfg.book.files.len());

    match args.command {
        Command::Uci => {
            let mut engine = UciEngine::new(&cfg);
            engine.run_loop().context("UCI loop")?;
        }
        Command::Bestmove { fen, moves } => {
            let mut pos = match fen {
                Some(f) => Position::from_fen(&f)?,
                None => Position::startpos(),
            };
            pos.play_uci_moves(&moves)?;
            let mut selector = MoveSelector::from_config(&cfg);
            let sel = selector.select_move(&mut pos)?;
            match &sel.origin {
                MoveOrigin::Book { source, weight } => println!("{} (book {source}, weight {weight})", pos.to_uci(sel.mv)),
                MoveOrigin::Search { score_cp, nodes } => {
                    println!("{} (search depth {}, score {score_cp}, nodes {nodes})", pos.to_uci(sel.mv), cfg.depth)
                }
            }
        }
    }
    Ok(())
}
