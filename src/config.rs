use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::search::eval::EvalConfig;

pub const DEFAULT_DEPTH: u32 = 3;

const DEFAULT_BOOK_DIR: &str = "polyglot-collection";
const DEFAULT_BOOK_FILES: [&str; 12] = [
    "varied.bin",
    "Performance.bin",
    "KomodoVariety.bin",
    "komodo.bin",
    "gm2600.bin",
    "gm2001.bin",
    "final-book.bin",
    "Elo2400.bin",
    "DCbook_large.bin",
    "codekiddy.bin",
    "book2.bin",
    "Book.bin",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("search depth must be at least 1")]
    ZeroDepth,
}

/// Where the opening books live. Relative file names resolve against
/// `directory` when one is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub directory: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            directory: Some(PathBuf::from(DEFAULT_BOOK_DIR)),
            files: DEFAULT_BOOK_FILES.iter().map(PathBuf::from).collect(),
        }
    }
}

impl BookConfig {
    pub fn disabled() -> Self { Self { directory: None, files: Vec::new() } }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|f| match &self.directory {
                Some(dir) if f.is_relative() => dir.join(f),
                _ => f.clone(),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub depth: u32,
    pub eval: EvalConfig,
    pub book: BookConfig,
}

impl Default for EngineConfig {
    fn default() -> Self { Self { depth: DEFAULT_DEPTH, eval: EvalConfig::default(), book: BookConfig::default() } }
}

impl EngineConfig {
    /// Read a JSON config. Missing fields keep their defaults.
    pub fn load<Q: AsRef<Path>>(path: Q) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let cfg: EngineConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth == 0 { return Err(ConfigError::ZeroDepth); }
        Ok(())
    }
}
