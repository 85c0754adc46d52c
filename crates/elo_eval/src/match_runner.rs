//! Match runner for playing a series of games at one opponent rating

use std::fmt;

use chess_core::Color;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::game::{play_game, GameResult, Outcome, Player};
use crate::openings::OpeningBook;
use crate::time_control::{CancelFlag, MoveBudget};
use crate::uci_process::{EngineSpec, ProtocolTimeouts, UciProcess};

/// One finished game of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// 1-based position in the match
    pub number: u32,
    pub candidate_white: bool,
    /// Candidate's points: 1, 0.5 or 0
    pub score: f64,
    pub result: GameResult,
}

/// Result of a match, from the candidate's perspective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Reference strength the match was played at
    pub rating: i32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub games: u32,
    /// Left out of the final estimate by warmup decay
    #[serde(default)]
    pub warmup: bool,
    /// Every game in play order
    #[serde(default)]
    pub records: Vec<GameRecord>,
}

impl MatchResult {
    pub fn new(rating: i32) -> Self {
        Self {
            rating,
            wins: 0,
            draws: 0,
            losses: 0,
            games: 0,
            warmup: false,
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: Outcome, candidate: Color) {
        match outcome.score_for(candidate) {
            s if s >= 1.0 => self.wins += 1,
            s if s > 0.0 => self.draws += 1,
            _ => self.losses += 1,
        }
        self.games += 1;
    }

    /// Points scored: 1 per win, 0.5 per draw.
    pub fn score(&self) -> f64 {
        self.wins as f64 + 0.5 * self.draws as f64
    }

    /// Score per game (0.5 for an empty match)
    pub fn fraction(&self) -> f64 {
        if self.games == 0 {
            return 0.5;
        }
        self.score() / self.games as f64
    }
}

/// Configuration for a match
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    /// Number of games to play
    pub games: u32,
    /// Time allowed for each move
    pub budget: MoveBudget,
}

/// A game as handed to a [`GameSink`], with the match it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct CompletedGame<'a> {
    /// 1-based count of matches this runner has started
    pub match_number: u32,
    pub rating: i32,
    pub candidate: &'a str,
    pub reference: &'a str,
    pub record: &'a GameRecord,
}

/// Receives every game as soon as it has been scored.
pub trait GameSink {
    fn game_finished(&mut self, game: &CompletedGame<'_>);
}

impl<F: FnMut(&CompletedGame<'_>)> GameSink for F {
    fn game_finished(&mut self, game: &CompletedGame<'_>) {
        self(game)
    }
}

/// Plays matches between a candidate and a reference player
pub struct MatchRunner {
    config: MatchConfig,
    openings: Option<OpeningBook>,
    cancel: CancelFlag,
    sinks: Vec<Box<dyn GameSink>>,
    matches_started: u32,
}

impl fmt::Debug for MatchRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRunner")
            .field("config", &self.config)
            .field("openings", &self.openings.as_ref().map(OpeningBook::len))
            .field("sinks", &self.sinks.len())
            .field("matches_started", &self.matches_started)
            .finish()
    }
}

impl MatchRunner {
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            openings: None,
            cancel: CancelFlag::new(),
            sinks: Vec::new(),
            matches_started: 0,
        }
    }

    /// Also hand every finished game to `sink`.
    pub fn with_sink(mut self, sink: impl GameSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Start each pair of games from a random line of `book`.
    pub fn with_openings(mut self, book: OpeningBook) -> Self {
        self.openings = Some(book);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Run a match at `rating`. The candidate is White in the first game and
    /// colors alternate after every game; both games of a pair share an
    /// opening.
    ///
    /// When cancelled, the games finished so far are returned.
    pub fn run_match(
        &mut self,
        candidate: &mut dyn Player,
        reference: &mut dyn Player,
        rating: i32,
    ) -> Result<MatchResult, EngineError> {
        let mut result = MatchResult::new(rating);
        let mut opening: Vec<String> = Vec::new();
        self.matches_started += 1;

        for game_num in 0..self.config.games {
            if self.cancel.is_cancelled() {
                info!(rating, played = result.games, "match cancelled");
                break;
            }

            let candidate_white = game_num % 2 == 0;
            if candidate_white {
                opening = match self.openings.as_mut() {
                    Some(book) => book.pick().to_vec(),
                    None => Vec::new(),
                };
            }

            let (game, color) = if candidate_white {
                (play_game(candidate, reference, &opening, &self.config.budget)?, Color::White)
            } else {
                (play_game(reference, candidate, &opening, &self.config.budget)?, Color::Black)
            };
            result.record(game.outcome, color);
            log_game(game_num + 1, self.config.games, &game, color, &result);

            let record = GameRecord {
                number: game_num + 1,
                candidate_white,
                score: game.outcome.score_for(color),
                result: game,
            };
            let finished = CompletedGame {
                match_number: self.matches_started,
                rating,
                candidate: candidate.name(),
                reference: reference.name(),
                record: &record,
            };
            for sink in &mut self.sinks {
                sink.game_finished(&finished);
            }
            result.records.push(record);
        }

        Ok(result)
    }
}

fn log_game(number: u32, total: u32, game: &GameResult, candidate: Color, so_far: &MatchResult) {
    info!(
        game = number,
        of = total,
        result = %game.outcome,
        candidate = ?candidate,
        termination = ?game.termination,
        plies = game.plies,
        "score {}-{}-{}",
        so_far.wins,
        so_far.draws,
        so_far.losses
    );
}

/// Plays one whole match at a requested rating.
pub trait MatchPlayer {
    fn play_match(&mut self, rating: i32) -> Result<MatchResult, EngineError>;
}

/// Names of the reference engine's strength options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthOptions {
    pub limit: String,
    pub rating: String,
}

impl Default for StrengthOptions {
    fn default() -> Self {
        Self {
            limit: "UCI_LimitStrength".to_string(),
            rating: "UCI_Elo".to_string(),
        }
    }
}

impl StrengthOptions {
    /// `setoption` pairs that pin the reference to `rating`.
    pub fn settings(&self, rating: i32) -> Vec<(String, String)> {
        vec![
            (self.limit.clone(), "true".to_string()),
            (self.rating.clone(), rating.to_string()),
        ]
    }
}

/// Runs every match with freshly started candidate and reference processes.
#[derive(Debug)]
pub struct EngineMatchPlayer {
    candidate: EngineSpec,
    reference: EngineSpec,
    timeouts: ProtocolTimeouts,
    strength: StrengthOptions,
    runner: MatchRunner,
}

impl EngineMatchPlayer {
    pub fn new(candidate: EngineSpec, reference: EngineSpec, runner: MatchRunner) -> Self {
        Self {
            candidate,
            reference,
            timeouts: ProtocolTimeouts::default(),
            strength: StrengthOptions::default(),
            runner,
        }
    }

    pub fn with_timeouts(mut self, timeouts: ProtocolTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_strength_options(mut self, strength: StrengthOptions) -> Self {
        self.strength = strength;
        self
    }
}

impl MatchPlayer for EngineMatchPlayer {
    fn play_match(&mut self, rating: i32) -> Result<MatchResult, EngineError> {
        // Both processes are stopped when they go out of scope, on every path.
        let mut candidate = UciProcess::new(self.candidate.clone(), self.timeouts);
        candidate.start()?;
        let mut reference = UciProcess::new(self.reference.clone(), self.timeouts);
        reference.start()?;
        reference.configure(&self.strength.settings(rating))?;

        info!(
            candidate = candidate.name(),
            reference = reference.name(),
            rating,
            games = self.runner.config().games,
            "starting match"
        );
        self.runner.run_match(&mut candidate, &mut reference, rating)
    }
}

#[cfg(test)]
#[path = "match_runner_tests.rs"]
mod match_runner_tests;
