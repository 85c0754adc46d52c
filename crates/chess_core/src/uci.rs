//! Long algebraic move text as used by the UCI protocol (`e2e4`, `e7e8q`).

use std::fmt;

use crate::types::*;

impl Move {
    /// Parses move text without looking at a position.
    ///
    /// Null moves (`0000`, `(none)`) and malformed text yield `None`.
    pub fn from_uci(txt: &str) -> Option<Move> {
        let txt = txt.trim();
        if !(4..=5).contains(&txt.len()) || !txt.is_ascii() {
            return None;
        }
        let from = coord_to_sq(&txt[0..2])?;
        let to = coord_to_sq(&txt[2..4])?;
        let promo = match txt[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_char(c)? {
                PieceKind::Pawn | PieceKind::King => return None,
                kind => Some(kind),
            },
        };
        Some(Move { from, to, promo })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", sq_to_coord(self.from), sq_to_coord(self.to))?;
        if let Some(p) = self.promo {
            write!(f, "{}", p.to_char())?;
        }
        Ok(())
    }
}

pub fn move_to_uci(mv: Move) -> String {
    mv.to_string()
}
