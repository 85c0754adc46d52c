//! Error types for engine processes, estimation, configuration and runs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures talking to an engine process.
///
/// `Spawn` and `Protocol` mean the engine cannot be used at all and abort
/// the run. `Timeout` and `Crashed` happen mid-game and only cost the
/// stalled side that game.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{engine}: {message}")]
    Protocol { engine: String, message: String },

    #[error("{engine}: no `{expected}` within {waited:?}")]
    Timeout {
        engine: String,
        expected: &'static str,
        waited: Duration,
    },

    #[error("{engine}: process exited or closed its pipes")]
    Crashed { engine: String },
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Spawn { .. } | EngineError::Protocol { .. })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EstimateError {
    #[error("no games to estimate from")]
    NoGames,

    #[error("score {score} is outside [0, {games}]")]
    ScoreOutOfRange { score: f64, games: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no matches were completed")]
    NoMatches,

    #[error("report {path}: {source}")]
    ReportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report format: {0}")]
    ReportFormat(#[from] serde_json::Error),

    #[error("game log directory {path}: {source}")]
    GameLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
