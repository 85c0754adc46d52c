//! Choosing the reference rating for each match.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::estimator::{Estimator, Sample};
use crate::match_runner::MatchResult;
use crate::uci_process::UciOption;

/// Range used when the reference engine does not advertise one.
pub const DEFAULT_RANGE: RatingRange = RatingRange { min: 800, max: 2800 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: i32,
    pub max: i32,
}

impl RatingRange {
    pub fn new(min: i32, max: i32) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::Invalid(format!(
                "min rating ({min}) must be <= max rating ({max})"
            )));
        }
        Ok(Self { min, max })
    }

    /// Bounds of a `spin` option, if it has both and they fit an `i32`.
    pub fn from_option(opt: &UciOption) -> Option<Self> {
        let min = i32::try_from(opt.min?).ok()?;
        let max = i32::try_from(opt.max?).ok()?;
        Self::new(min, max).ok()
    }

    pub fn midpoint(&self) -> i32 {
        (self.min + self.max).div_euclid(2)
    }

    /// Rounds and clamps a rating estimate into the range.
    pub fn clamp(&self, rating: f64) -> i32 {
        (rating.round() as i32).clamp(self.min, self.max)
    }
}

impl Default for RatingRange {
    fn default() -> Self {
        DEFAULT_RANGE
    }
}

/// Default warmup when none is configured: two matches, but always leaving
/// at least one rated match.
pub fn resolve_warmup(warmup: Option<u32>, matches: u32) -> Result<u32, ConfigError> {
    if matches == 0 {
        return Err(ConfigError::Invalid("at least one match is required".to_string()));
    }
    let warmup = warmup.unwrap_or_else(|| 2.min(matches - 1));
    if warmup >= matches {
        return Err(ConfigError::Invalid(format!(
            "warmup ({warmup}) must be less than the number of matches ({matches})"
        )));
    }
    Ok(warmup)
}

/// How many of the oldest matches are left out of the rating after `total`
/// matches with a warmup of `warmup`.
///
/// Nothing is dropped until the rated matches outnumber the warmup ones;
/// after that one more warmup match goes with every new match.
pub fn excluded_count(warmup: usize, total: usize) -> usize {
    if warmup == 0 {
        return 0;
    }
    let rated = total.saturating_sub(warmup);
    warmup.min((rated + 1).saturating_sub(warmup))
}

/// The matches that feed the estimator once warmup decay is applied.
pub fn rated_matches(history: &[MatchResult], warmup: usize) -> &[MatchResult] {
    &history[excluded_count(warmup, history.len()).min(history.len())..]
}

/// Picks the rating for the next match from the matches played so far.
pub trait RatingStrategy {
    fn next_rating(&self, history: &[MatchResult]) -> i32;
}

/// Plays each match at the current performance estimate.
#[derive(Debug, Clone)]
pub struct Adaptive {
    range: RatingRange,
    warmup: usize,
    estimator: Estimator,
}

impl Adaptive {
    pub fn new(range: RatingRange, warmup: usize, estimator: Estimator) -> Self {
        Self {
            range,
            warmup,
            estimator,
        }
    }
}

impl RatingStrategy for Adaptive {
    fn next_rating(&self, history: &[MatchResult]) -> i32 {
        let Some(last) = history.last() else {
            return self.range.midpoint();
        };
        let used = rated_matches(history, self.warmup);
        let samples: Vec<Sample> = used.iter().map(Sample::from).collect();
        match self.estimator.estimate(&samples) {
            Ok(estimate) => {
                let next = self.range.clamp(estimate);
                info!(
                    estimate = format_args!("{estimate:.0}"),
                    next,
                    used = used.len(),
                    played = history.len(),
                    "adaptive"
                );
                next
            }
            Err(e) => {
                warn!("no estimate yet ({e}), repeating rating {}", last.rating);
                last.rating
            }
        }
    }
}

/// Evenly spaced ratings fixed before the first match.
#[derive(Debug, Clone)]
pub struct Linear {
    levels: Vec<i32>,
}

impl Linear {
    pub fn new(range: RatingRange, matches: u32) -> Self {
        let levels = match matches {
            0 => Vec::new(),
            1 => vec![range.midpoint()],
            n => {
                let step = f64::from(range.max - range.min) / f64::from(n - 1);
                (0..n)
                    .map(|i| (f64::from(range.min) + f64::from(i) * step).round() as i32)
                    .collect()
            }
        };
        Self { levels }
    }

    pub fn levels(&self) -> &[i32] {
        &self.levels
    }
}

impl RatingStrategy for Linear {
    fn next_rating(&self, history: &[MatchResult]) -> i32 {
        self.levels
            .get(history.len())
            .or(self.levels.last())
            .copied()
            .unwrap_or_default()
    }
}

/// Halves a working range after every match.
#[derive(Debug, Clone)]
pub struct BinarySearch {
    range: RatingRange,
}

impl BinarySearch {
    pub fn new(range: RatingRange) -> Self {
        Self { range }
    }

    /// The working range after replaying `history`. A score above one half
    /// raises the lower bound to that match's rating; anything else lowers
    /// the upper bound.
    pub fn working_range(&self, history: &[MatchResult]) -> (f64, f64) {
        let mut lo = f64::from(self.range.min);
        let mut hi = f64::from(self.range.max);
        for m in history {
            if m.fraction() > 0.5 {
                lo = f64::from(m.rating);
            } else {
                hi = f64::from(m.rating);
            }
        }
        (lo, hi)
    }
}

impl RatingStrategy for BinarySearch {
    fn next_rating(&self, history: &[MatchResult]) -> i32 {
        let (lo, hi) = self.working_range(history);
        let next = ((lo + hi) / 2.0).round() as i32;
        if let Some(last) = history.last() {
            info!(
                score = format_args!("{:.0}%", last.fraction() * 100.0),
                lo, hi, next, "bsearch"
            );
        }
        next
    }
}

/// Which strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Adaptive,
    Linear,
    Bsearch,
}

impl Strategy {
    pub fn build(
        self,
        range: RatingRange,
        matches: u32,
        warmup: u32,
        estimator: Estimator,
    ) -> Box<dyn RatingStrategy> {
        match self {
            Strategy::Adaptive => Box::new(Adaptive::new(range, warmup as usize, estimator)),
            Strategy::Linear => Box::new(Linear::new(range, matches)),
            Strategy::Bsearch => Box::new(BinarySearch::new(range)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Adaptive => "adaptive",
            Strategy::Linear => "linear",
            Strategy::Bsearch => "bsearch",
        })
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adaptive" => Ok(Strategy::Adaptive),
            "linear" => Ok(Strategy::Linear),
            "bsearch" | "binary" => Ok(Strategy::Bsearch),
            other => Err(ConfigError::Invalid(format!(
                "unknown strategy '{other}', use adaptive, linear or bsearch"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod strategy_tests;
