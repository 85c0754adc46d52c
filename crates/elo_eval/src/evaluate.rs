//! The evaluation loop and its report.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::EvalError;
use crate::estimator::Estimator;
use crate::match_runner::{EngineMatchPlayer, MatchPlayer, MatchResult, MatchRunner};
use crate::openings::OpeningBook;
use crate::pgn::PgnLogger;
use crate::strategy::{excluded_count, RatingRange, Strategy, DEFAULT_RANGE};
use crate::time_control::CancelFlag;
use crate::uci_process::{EngineSpec, ProtocolTimeouts, UciProcess};

/// Runs a fixed number of matches, letting a strategy choose each rating.
#[derive(Debug, Clone)]
pub struct Evaluator {
    strategy: Strategy,
    range: RatingRange,
    matches: u32,
    warmup: u32,
    estimator: Estimator,
    cancel: CancelFlag,
}

impl Evaluator {
    pub fn new(strategy: Strategy, range: RatingRange, matches: u32, warmup: u32) -> Self {
        Self {
            strategy,
            range,
            matches,
            warmup,
            estimator: Estimator::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Stop before the next match once `cancel` is set.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(&self, player: &mut dyn MatchPlayer) -> Result<EvaluationReport, EvalError> {
        let strategy = self
            .strategy
            .build(self.range, self.matches, self.warmup, self.estimator);
        let mut history: Vec<MatchResult> = Vec::with_capacity(self.matches as usize);

        info!(
            strategy = %self.strategy,
            min = self.range.min,
            max = self.range.max,
            matches = self.matches,
            warmup = self.warmup,
            "starting evaluation"
        );

        for index in 0..self.matches {
            if self.cancel.is_cancelled() {
                info!(completed = history.len(), "evaluation cancelled");
                break;
            }

            let rating = strategy.next_rating(&history);
            let result = player.play_match(rating)?;
            if result.games == 0 {
                // Cancelled before its first game finished.
                break;
            }

            info!(
                "match {}/{}: rating {} scored {:.1}/{} ({:.0}%)",
                index + 1,
                self.matches,
                rating,
                result.score(),
                result.games,
                result.fraction() * 100.0
            );
            history.push(result);
        }

        if history.is_empty() {
            return Err(EvalError::NoMatches);
        }

        let report = EvaluationReport::from_history(
            self.strategy,
            self.range,
            self.warmup,
            history,
            &self.estimator,
        )?;
        info!(
            rating = format_args!("{:.0}", report.rating),
            rated_games = report.rated_games,
            "evaluation finished"
        );
        Ok(report)
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub strategy: Strategy,
    pub range: RatingRange,
    /// Every completed match in play order
    pub matches: Vec<MatchResult>,
    pub warmup: u32,
    /// Oldest matches left out of the estimate
    pub warmup_excluded: usize,
    pub total_score: f64,
    pub total_games: u32,
    pub rated_score: f64,
    pub rated_games: u32,
    /// Performance rating over the rated matches
    pub rating: f64,
}

impl EvaluationReport {
    /// Applies warmup decay to `matches` and estimates the final rating.
    pub fn from_history(
        strategy: Strategy,
        range: RatingRange,
        warmup: u32,
        mut matches: Vec<MatchResult>,
        estimator: &Estimator,
    ) -> Result<Self, EvalError> {
        let excluded = excluded_count(warmup as usize, matches.len());
        for (i, m) in matches.iter_mut().enumerate() {
            m.warmup = i < excluded;
        }
        let rated = &matches[excluded..];
        let rating = estimator.estimate_matches(rated)?;

        Ok(Self {
            strategy,
            range,
            warmup,
            warmup_excluded: excluded,
            total_score: matches.iter().map(MatchResult::score).sum(),
            total_games: matches.iter().map(|m| m.games).sum(),
            rated_score: rated.iter().map(MatchResult::score).sum(),
            rated_games: rated.iter().map(|m| m.games).sum(),
            rating,
            matches,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), EvalError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| EvalError::ReportIo {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let contents = std::fs::read_to_string(path).map_err(|source| EvalError::ReportIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Plain-text table of the matches and the final estimate.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:>5}  {:>6}  {:>5}  {:>4}", "ELO", "Score", "Games", "Pct");
        for m in &self.matches {
            let _ = writeln!(
                out,
                "{:>5}  {:>6.1}  {:>5}  {:>3.0}%{}",
                m.rating,
                m.score(),
                m.games,
                m.fraction() * 100.0,
                if m.warmup { "  (warmup)" } else { "" }
            );
        }
        out.push('\n');
        let _ = writeln!(out, "Total: {:.1} / {}", self.total_score, self.total_games);
        if self.warmup_excluded > 0 {
            let _ = writeln!(
                out,
                "Warmup: {} match(es) excluded from rating ({:.1} / {} rated)",
                self.warmup_excluded, self.rated_score, self.rated_games
            );
        }
        let _ = writeln!(out, "Performance ELO: {:.0}", self.rating);
        out
    }
}

/// Reads the bounds of the reference engine's rating option, falling back
/// to [`DEFAULT_RANGE`] when the engine cannot be started or has no such
/// option.
pub fn detect_rating_range(
    reference: &EngineSpec,
    timeouts: ProtocolTimeouts,
    option: &str,
) -> RatingRange {
    let mut process = UciProcess::new(reference.clone(), timeouts);
    let detected = match process.start() {
        Ok(()) => process.option(option).and_then(RatingRange::from_option),
        Err(e) => {
            warn!("could not detect the {option} range: {e}");
            None
        }
    };
    process.stop();

    match detected {
        Some(range) => {
            info!(min = range.min, max = range.max, "{} range of {}", option, process.name());
            range
        }
        None => {
            info!(
                min = DEFAULT_RANGE.min,
                max = DEFAULT_RANGE.max,
                "using the default rating range"
            );
            DEFAULT_RANGE
        }
    }
}

/// Runs a whole evaluation from a validated configuration.
pub fn evaluate(config: &RunConfig, cancel: CancelFlag) -> Result<EvaluationReport, EvalError> {
    config.validate()?;
    let warmup = config.resolved_warmup()?;
    let timeouts = config.timeouts();

    let detected = if config.has_explicit_range() {
        DEFAULT_RANGE
    } else {
        detect_rating_range(&config.reference, timeouts, &config.rating_option)
    };
    let range = config.rating_range(detected)?;

    let mut runner = MatchRunner::new(config.match_config()).with_cancel(cancel.clone());
    if config.use_openings {
        runner = runner.with_openings(OpeningBook::standard(config.opening_seed));
    }
    if let Some(base) = &config.game_log_dir {
        let logger = PgnLogger::create(base, &config.engine.label())?;
        info!(dir = %logger.dir().display(), "saving games as PGN");
        runner = runner.with_sink(logger);
    }
    let mut player = EngineMatchPlayer::new(config.engine.clone(), config.reference.clone(), runner)
        .with_timeouts(timeouts)
        .with_strength_options(config.strength());

    let report = Evaluator::new(config.strategy, range, config.matches, warmup)
        .with_cancel(cancel)
        .run(&mut player)?;

    if let Some(path) = &config.report {
        report.save(path)?;
        info!(path = %path.display(), "report written");
    }
    Ok(report)
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod evaluate_tests;
