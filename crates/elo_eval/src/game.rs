//! Plays one refereed game between two players.

use std::fmt;

use chess_core::{Color, Game, TerminalStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::time_control::MoveBudget;
use crate::uci_process::UciProcess;

/// Something that can be asked for moves. Moves come back as raw text and
/// are validated by the referee, never by the player.
pub trait Player {
    fn name(&self) -> &str;

    fn new_game(&mut self) -> Result<(), EngineError>;

    /// `moves` is the whole game so far from the start position.
    fn request_move(&mut self, moves: &[String], budget: &MoveBudget) -> Result<String, EngineError>;
}

impl Player for UciProcess {
    fn name(&self) -> &str {
        UciProcess::name(self)
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        UciProcess::new_game(self)
    }

    fn request_move(&mut self, moves: &[String], budget: &MoveBudget) -> Result<String, EngineError> {
        UciProcess::request_move(self, moves, budget)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    WhiteWin,
    BlackWin,
    Draw,
}

impl Outcome {
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => Outcome::WhiteWin,
            Color::Black => Outcome::BlackWin,
        }
    }

    /// Points for `color`: 1, 0.5 or 0.
    pub fn score_for(self, color: Color) -> f64 {
        match self {
            Outcome::Draw => 0.5,
            o if o == Outcome::win_for(color) => 1.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::WhiteWin => "1-0",
            Outcome::BlackWin => "0-1",
            Outcome::Draw => "1/2-1/2",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    Checkmate,
    Stalemate,
    Repetition,
    FiftyMove,
    IllegalMove,
    Timeout,
    Crash,
}

impl Termination {
    /// Text for the PGN `Termination` tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::Repetition => "threefold repetition",
            Termination::FiftyMove => "fifty-move rule",
            Termination::IllegalMove => "illegal move",
            Termination::Timeout => "time forfeit",
            Termination::Crash => "engine crash",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub outcome: Outcome,
    pub termination: Termination,
    pub plies: usize,
    /// Every move of the game as UCI text, opening plies included.
    pub moves: Vec<String>,
}

impl GameResult {
    fn finished(game: &Game, outcome: Outcome, termination: Termination) -> Self {
        Self {
            outcome,
            termination,
            plies: game.ply_count(),
            moves: game.uci_moves(),
        }
    }

    /// `side` failed to produce a usable move and loses.
    fn forfeit(game: &Game, side: Color, termination: Termination) -> Self {
        Self::finished(game, Outcome::win_for(side.other()), termination)
    }
}

fn forfeit_reason(err: &EngineError) -> Termination {
    match err {
        EngineError::Timeout { .. } => Termination::Timeout,
        _ => Termination::Crash,
    }
}

/// Plays `opening` and then asks the side to move for each ply until the
/// rules end the game.
///
/// Timeouts, crashes and illegal moves lose the game for the side at fault
/// and are reported as a [`GameResult`]. Only fatal engine errors (a
/// restart that cannot complete its handshake) are returned as `Err`.
pub fn play_game(
    white: &mut dyn Player,
    black: &mut dyn Player,
    opening: &[String],
    budget: &MoveBudget,
) -> Result<GameResult, EngineError> {
    let mut game = Game::new();

    if let Some(lost) = start_player(white, Color::White, &game)? {
        return Ok(lost);
    }
    if let Some(lost) = start_player(black, Color::Black, &game)? {
        return Ok(lost);
    }

    for mv in opening {
        if let Err(e) = game.apply_uci(mv) {
            warn!("opening line stopped early: {e}");
            break;
        }
    }

    let result = loop {
        if let Some(result) = finished(&game, game.status()) {
            break result;
        }

        let side = game.side_to_move();
        let moves = game.uci_moves();
        let reply = match side {
            Color::White => white.request_move(&moves, budget),
            Color::Black => black.request_move(&moves, budget),
        };

        let text = match reply {
            Ok(text) => text,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => break GameResult::forfeit(&game, side, forfeit_reason(&e)),
        };

        match game.apply_uci(&text) {
            Ok(_) => debug!(ply = game.ply_count(), "{text}"),
            Err(e) => {
                let name = match side {
                    Color::White => white.name(),
                    Color::Black => black.name(),
                };
                warn!(player = name, "{e}");
                break GameResult::forfeit(&game, side, Termination::IllegalMove);
            }
        }
    };

    info!(
        white = white.name(),
        black = black.name(),
        result = %result.outcome,
        termination = ?result.termination,
        plies = result.plies,
        "game over"
    );
    Ok(result)
}

/// `None` while the game is still running.
fn finished(game: &Game, status: TerminalStatus) -> Option<GameResult> {
    let (outcome, termination) = match status {
        TerminalStatus::InProgress => return None,
        TerminalStatus::Checkmate { winner } => (Outcome::win_for(winner), Termination::Checkmate),
        TerminalStatus::Stalemate => (Outcome::Draw, Termination::Stalemate),
        TerminalStatus::FiftyMove => (Outcome::Draw, Termination::FiftyMove),
        TerminalStatus::Repetition => (Outcome::Draw, Termination::Repetition),
    };
    Some(GameResult::finished(game, outcome, termination))
}

/// Resets `player` for a new game. A non-fatal failure forfeits the game.
fn start_player(
    player: &mut dyn Player,
    side: Color,
    game: &Game,
) -> Result<Option<GameResult>, EngineError> {
    match player.new_game() {
        Ok(()) => Ok(None),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(player = player.name(), "lost before the first move: {e}");
            Ok(Some(GameResult::forfeit(game, side, forfeit_reason(&e))))
        }
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
