//! Run configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::match_runner::{MatchConfig, StrengthOptions};
use crate::strategy::{resolve_warmup, RatingRange, Strategy};
use crate::time_control::MoveBudget;
use crate::uci_process::{EngineSpec, ProtocolTimeouts};

/// Everything a run needs, fixed before the first match.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Engine under evaluation
    pub engine: EngineSpec,
    /// Strength-limited opponent
    pub reference: EngineSpec,
    pub matches: u32,
    pub games_per_match: u32,
    pub movetime_ms: u64,
    pub strategy: Strategy,
    /// Explicit bounds; a missing one is read from the reference engine
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
    /// Matches excluded from the final estimate (default: min(2, matches - 1))
    pub warmup: Option<u32>,
    pub use_openings: bool,
    pub opening_seed: Option<u64>,
    pub handshake_timeout_ms: u64,
    /// Extra time past `movetime_ms` before a move counts as timed out
    pub move_grace_ms: u64,
    pub quit_grace_ms: u64,
    pub limit_strength_option: String,
    pub rating_option: String,
    /// Where to write the JSON report
    pub report: Option<PathBuf>,
    /// Each run writes its games as PGN into a fresh directory under this one
    pub game_log_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let strength = StrengthOptions::default();
        Self {
            engine: EngineSpec::default(),
            reference: EngineSpec::new("stockfish"),
            matches: 6,
            games_per_match: 10,
            movetime_ms: 100,
            strategy: Strategy::default(),
            min_rating: None,
            max_rating: None,
            warmup: None,
            use_openings: false,
            opening_seed: None,
            handshake_timeout_ms: 10_000,
            move_grace_ms: 2_000,
            quit_grace_ms: 5_000,
            limit_strength_option: strength.limit,
            rating_option: strength.rating,
            report: None,
            game_log_dir: None,
        }
    }
}

impl RunConfig {
    /// Load a TOML file. The result is not validated yet, so command-line
    /// overrides can be applied first.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.program.trim().is_empty() {
            return Err(invalid("no engine to evaluate"));
        }
        if self.reference.program.trim().is_empty() {
            return Err(invalid("no reference engine"));
        }
        if self.games_per_match == 0 {
            return Err(invalid("games_per_match must be at least 1"));
        }
        if self.movetime_ms == 0 {
            return Err(invalid("movetime_ms must be at least 1"));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(invalid("handshake_timeout_ms must be at least 1"));
        }
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            RatingRange::new(min, max)?;
        }
        self.resolved_warmup()?;
        Ok(())
    }

    pub fn resolved_warmup(&self) -> Result<u32, ConfigError> {
        resolve_warmup(self.warmup, self.matches)
    }

    /// Range from the explicit bounds, filling gaps from `detected`.
    pub fn rating_range(&self, detected: RatingRange) -> Result<RatingRange, ConfigError> {
        RatingRange::new(
            self.min_rating.unwrap_or(detected.min),
            self.max_rating.unwrap_or(detected.max),
        )
    }

    /// Both bounds were given, so the reference does not need probing.
    pub fn has_explicit_range(&self) -> bool {
        self.min_rating.is_some() && self.max_rating.is_some()
    }

    pub fn budget(&self) -> MoveBudget {
        MoveBudget::new(
            Duration::from_millis(self.movetime_ms),
            Duration::from_millis(self.move_grace_ms),
        )
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            games: self.games_per_match,
            budget: self.budget(),
        }
    }

    pub fn timeouts(&self) -> ProtocolTimeouts {
        ProtocolTimeouts {
            handshake: Duration::from_millis(self.handshake_timeout_ms),
            quit_grace: Duration::from_millis(self.quit_grace_ms),
        }
    }

    pub fn strength(&self) -> StrengthOptions {
        StrengthOptions {
            limit: self.limit_strength_option.clone(),
            rating: self.rating_option.clone(),
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
