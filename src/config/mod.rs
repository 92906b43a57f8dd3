//! Interpreter configuration
//!
//! Defaults suit an interactive session; the binary overlays environment
//! variables with [`InterpreterConfig::from_env`].

use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

/// Default first line number for AUTO
pub const DEFAULT_AUTO_START: u32 = 10;
/// Default AUTO increment
pub const DEFAULT_AUTO_INCREMENT: u32 = 10;
/// Default log file written by the binary
pub const DEFAULT_LOG_FILE: &str = "retro-basic.log";

pub const ENV_RND_SEED: &str = "BASIC_RND_SEED";
pub const ENV_PROGRAM_DIR: &str = "BASIC_PROGRAM_DIR";
pub const ENV_LOG_LEVEL: &str = "BASIC_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "BASIC_LOG_FILE";

/// Settings for an interpreter session
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    /// First line number used by a bare AUTO
    pub auto_start: u32,
    /// Increment used by a bare AUTO
    pub auto_increment: u32,
    /// Fixed RND seed; `None` seeds from entropy
    pub rnd_seed: Option<u64>,
    /// Directory for SAVE/LOAD; `None` keeps programs in memory
    pub program_dir: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            auto_start: DEFAULT_AUTO_START,
            auto_increment: DEFAULT_AUTO_INCREMENT,
            rnd_seed: None,
            program_dir: None,
            log_level: LevelFilter::Warn,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl InterpreterConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`; unparsable values are ignored
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(seed) = lookup(ENV_RND_SEED).and_then(|v| v.trim().parse().ok()) {
            config.rnd_seed = Some(seed);
        }
        if let Some(dir) = lookup(ENV_PROGRAM_DIR).filter(|v| !v.trim().is_empty()) {
            config.program_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).and_then(|v| LevelFilter::from_str(v.trim()).ok()) {
            config.log_level = level;
        }
        if let Some(file) = lookup(ENV_LOG_FILE).filter(|v| !v.trim().is_empty()) {
            config.log_file = PathBuf::from(file);
        }

        config
    }

    /// Use a fixed RND seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rnd_seed = Some(seed);
        self
    }
}
