//! Performance rating under the logistic Elo model.
//!
//! Both searches are bisections over a monotonic expected-score function,
//! so they always terminate inside their bracket. Perfect and zero scores
//! have no finite solution and return the bracket's edge.

use tracing::warn;

use crate::error::EstimateError;
use crate::match_runner::MatchResult;

pub const DEFAULT_FLOOR: f64 = 0.0;
pub const DEFAULT_CEILING: f64 = 5000.0;
pub const DEFAULT_TOLERANCE: f64 = 0.001;
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// Bracket for a single-match rating difference.
pub const MAX_DIFFERENCE: f64 = 1000.0;

/// Expected score of `rating` against `opponent`, in (0, 1).
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((opponent - rating) / 400.0))
}

/// Games played against one opponent rating and the points scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub opponent: f64,
    pub games: f64,
    pub score: f64,
}

impl Sample {
    pub fn new(opponent: f64, games: f64, score: f64) -> Self {
        Self {
            opponent,
            games,
            score,
        }
    }
}

impl From<&MatchResult> for Sample {
    fn from(m: &MatchResult) -> Self {
        Sample::new(m.rating as f64, m.games as f64, m.score())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimator {
    pub floor: f64,
    pub ceiling: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for Estimator {
    fn default() -> Self {
        Self {
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Estimator {
    /// Rating difference Δ with `games × E(Δ) = score`, within ±[`MAX_DIFFERENCE`].
    pub fn rating_difference(&self, score: f64, games: f64) -> Result<f64, EstimateError> {
        check_score(score, games)?;
        if score == games {
            return Ok(MAX_DIFFERENCE);
        }
        if score == 0.0 {
            return Ok(-MAX_DIFFERENCE);
        }
        Ok(self.bisect(-MAX_DIFFERENCE, MAX_DIFFERENCE, score, |d| {
            games * expected_score(d, 0.0)
        }))
    }

    /// The single rating R whose total expected score over all samples
    /// equals the total points scored.
    pub fn estimate(&self, samples: &[Sample]) -> Result<f64, EstimateError> {
        let games: f64 = samples.iter().map(|s| s.games).sum();
        let score: f64 = samples.iter().map(|s| s.score).sum();
        for s in samples {
            check_range(s.score, s.games)?;
        }
        check_score(score, games)?;

        if score == games {
            return Ok(self.ceiling);
        }
        if score == 0.0 {
            return Ok(self.floor);
        }
        Ok(self.bisect(self.floor, self.ceiling, score, |r| {
            samples
                .iter()
                .map(|s| s.games * expected_score(r, s.opponent))
                .sum()
        }))
    }

    /// Shorthand for [`estimate`](Self::estimate) over whole matches.
    pub fn estimate_matches(&self, matches: &[MatchResult]) -> Result<f64, EstimateError> {
        let samples: Vec<Sample> = matches.iter().map(Sample::from).collect();
        self.estimate(&samples)
    }

    fn bisect(&self, mut lo: f64, mut hi: f64, observed: f64, expected: impl Fn(f64) -> f64) -> f64 {
        for _ in 0..self.max_iterations {
            let mid = (lo + hi) / 2.0;
            let e = expected(mid);
            if (e - observed).abs() < self.tolerance || mid <= lo || mid >= hi {
                return mid;
            }
            if e < observed {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let mid = (lo + hi) / 2.0;
        warn!(
            iterations = self.max_iterations,
            "rating search did not converge, using midpoint {mid:.1}"
        );
        mid
    }
}

fn check_score(score: f64, games: f64) -> Result<(), EstimateError> {
    if games.is_nan() || games <= 0.0 {
        return Err(EstimateError::NoGames);
    }
    check_range(score, games)
}

fn check_range(score: f64, games: f64) -> Result<(), EstimateError> {
    if (0.0..=games).contains(&score) {
        Ok(())
    } else {
        Err(EstimateError::ScoreOutOfRange { score, games })
    }
}

#[cfg(test)]
#[path = "estimator_tests.rs"]
mod estimator_tests;
