//! PGN game logs, one file per game.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use chess_core::{san_movetext, Color, IllegalMoveError, Move, Position};
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::EvalError;
use crate::match_runner::{CompletedGame, GameSink};

/// Render `game` as a PGN record dated `date` (`YYYY.MM.DD`).
///
/// The reference side is named with its rating; the candidate's Elo is
/// unknown and written as `?`.
pub fn game_to_pgn(game: &CompletedGame<'_>, date: &str) -> Result<String, IllegalMoveError> {
    let record = game.record;
    let reference = format!("{} {}", game.reference, game.rating);
    let (white, black) = if record.candidate_white {
        (game.candidate.to_string(), reference.clone())
    } else {
        (reference.clone(), game.candidate.to_string())
    };
    let (white_elo, black_elo) = if record.candidate_white {
        ("?".to_string(), game.rating.to_string())
    } else {
        (game.rating.to_string(), "?".to_string())
    };
    let result = record.result.outcome.to_string();

    let tags = [
        ("Event", format!("ELO Evaluation vs {reference}")),
        ("Site", "?".to_string()),
        ("Date", date.to_string()),
        ("Round", format!("{}.{}", game.match_number, record.number)),
        ("White", white),
        ("Black", black),
        ("Result", result.clone()),
        ("WhiteElo", white_elo),
        ("BlackElo", black_elo),
        ("Termination", record.result.termination.as_str().to_string()),
    ];

    let mut pgn = String::new();
    for (name, value) in tags {
        let _ = writeln!(pgn, "[{name} \"{}\"]", escape(&value));
    }
    pgn.push('\n');

    let moves = parse_moves(&record.result.moves)?;
    let movetext = san_movetext(&Position::startpos(), &moves)?;
    if movetext.is_empty() {
        pgn.push_str(&result);
    } else {
        let _ = write!(pgn, "{movetext} {result}");
    }
    pgn.push('\n');
    Ok(pgn)
}

fn parse_moves(uci: &[String]) -> Result<Vec<Move>, IllegalMoveError> {
    uci.iter()
        .enumerate()
        .map(|(ply, text)| {
            Move::from_uci(text).ok_or_else(|| IllegalMoveError {
                text: text.clone(),
                side: if ply % 2 == 0 { Color::White } else { Color::Black },
            })
        })
        .collect()
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Writes every finished game to `{match}-{game}.pgn` inside one directory.
#[derive(Debug, Clone)]
pub struct PgnLogger {
    dir: PathBuf,
    date: String,
}

impl PgnLogger {
    /// New directory `{engine}_{timestamp}` under `base`.
    pub fn create(base: &Path, engine: &str) -> Result<Self, EvalError> {
        let stamp = Utc::now().format("%Y-%m-%d_%H%M%S");
        Self::in_dir(base.join(format!("{engine}_{stamp}")))
    }

    /// Log into `dir`, creating it if needed.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self, EvalError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| EvalError::GameLog {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            date: Utc::now().format("%Y.%m.%d").to_string(),
        })
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, match_number: u32, game_number: u32) -> PathBuf {
        self.dir.join(format!("{match_number}-{game_number}.pgn"))
    }

    pub fn write(&self, game: &CompletedGame<'_>) -> io::Result<PathBuf> {
        let pgn = game_to_pgn(game, &self.date)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let path = self.path_for(game.match_number, game.record.number);
        std::fs::write(&path, pgn)?;
        Ok(path)
    }
}

impl GameSink for PgnLogger {
    fn game_finished(&mut self, game: &CompletedGame<'_>) {
        match self.write(game) {
            Ok(path) => debug!(path = %path.display(), "game saved"),
            Err(e) => warn!(
                game = game.record.number,
                error = %e,
                "could not save PGN"
            ),
        }
    }
}

#[cfg(test)]
#[path = "pgn_tests.rs"]
mod pgn_tests;
