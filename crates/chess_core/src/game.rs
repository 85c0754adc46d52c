//! Game state: a position plus the repetition history of one game.

use crate::board::{Position, Signature};
use crate::error::IllegalMoveError;
use crate::movegen::has_legal_move;
use crate::types::{Color, Move};

/// Outcome of checking a position for the end of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalStatus {
    InProgress,
    /// The side to move is mated; `winner` is the side that just moved.
    Checkmate { winner: Color },
    Stalemate,
    FiftyMove,
    Repetition,
}

impl TerminalStatus {
    pub fn is_over(self) -> bool {
        self != TerminalStatus::InProgress
    }
}

/// Classify `pos` given the signatures of every position reached so far
/// (including `pos` itself).
///
/// Checkmate and stalemate take precedence over the counters, then the
/// fifty-move rule, then threefold repetition.
pub fn terminal_status(pos: &Position, history: &[Signature]) -> TerminalStatus {
    if !has_legal_move(pos) {
        return if pos.in_check(pos.side_to_move) {
            TerminalStatus::Checkmate {
                winner: pos.side_to_move.other(),
            }
        } else {
            TerminalStatus::Stalemate
        };
    }
    if pos.is_fifty_move_draw() {
        return TerminalStatus::FiftyMove;
    }
    let current = pos.signature();
    if history.iter().filter(|&s| *s == current).count() >= 3 {
        return TerminalStatus::Repetition;
    }
    TerminalStatus::InProgress
}

/// One game from a starting position, validating every move it is given.
#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    history: Vec<Signature>,
    moves: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    pub fn from_position(position: Position) -> Self {
        Self {
            history: vec![position.signature()],
            position,
            moves: Vec::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn history(&self) -> &[Signature] {
        &self.history
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move
    }

    /// Moves played so far as UCI text, ready for `position startpos moves ...`.
    pub fn uci_moves(&self) -> Vec<String> {
        self.moves.iter().map(Move::to_string).collect()
    }

    pub fn apply(&mut self, mv: Move) -> Result<(), IllegalMoveError> {
        let next = self.position.apply(mv)?;
        self.history.push(next.signature());
        self.moves.push(mv);
        self.position = next;
        Ok(())
    }

    /// Parses and applies a move received as text. Unparseable text is
    /// reported as an illegal move by the side to move.
    pub fn apply_uci(&mut self, txt: &str) -> Result<Move, IllegalMoveError> {
        let mv = Move::from_uci(txt).ok_or_else(|| IllegalMoveError {
            text: txt.to_string(),
            side: self.side_to_move(),
        })?;
        self.apply(mv).map_err(|e| IllegalMoveError {
            text: txt.to_string(),
            ..e
        })?;
        Ok(mv)
    }

    pub fn status(&self) -> TerminalStatus {
        terminal_status(&self.position, &self.history)
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
