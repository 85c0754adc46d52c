//! Standard Algebraic Notation for game records.

use crate::board::Position;
use crate::error::IllegalMoveError;
use crate::movegen::{has_legal_move, legal_moves};
use crate::types::*;

/// SAN for `mv` played in `pos`, with `+`/`#` suffix.
pub fn to_san(pos: &Position, mv: Move) -> Result<String, IllegalMoveError> {
    let next = pos.apply(mv)?;
    let mut san = san_body(pos, mv);

    let opponent = next.side_to_move;
    if next.in_check(opponent) {
        san.push(if has_legal_move(&next) { '+' } else { '#' });
    }
    Ok(san)
}

/// Numbered movetext (`1. e4 e5 2. Nf3`) for `moves` played from `start`.
pub fn san_movetext(start: &Position, moves: &[Move]) -> Result<String, IllegalMoveError> {
    let mut pos = start.clone();
    let mut parts = Vec::with_capacity(moves.len() + moves.len() / 2 + 1);

    for (i, &mv) in moves.iter().enumerate() {
        match pos.side_to_move {
            Color::White => parts.push(format!("{}.", pos.fullmove_number)),
            Color::Black if i == 0 => parts.push(format!("{}...", pos.fullmove_number)),
            Color::Black => {}
        }
        parts.push(to_san(&pos, mv)?);
        pos = pos.apply(mv)?;
    }
    Ok(parts.join(" "))
}

/// SAN without the check suffix. `mv` must be legal in `pos`.
fn san_body(pos: &Position, mv: Move) -> String {
    let Some(piece) = pos.piece_at(mv.from) else {
        return mv.to_string();
    };
    let to = sq_to_coord(mv.to);
    let changes_file = file_of(mv.from) != file_of(mv.to);

    match piece.kind {
        PieceKind::King if (file_of(mv.to) - file_of(mv.from)).abs() == 2 => {
            if file_of(mv.to) > file_of(mv.from) {
                "O-O".to_string()
            } else {
                "O-O-O".to_string()
            }
        }
        PieceKind::Pawn => {
            let mut san = String::new();
            // A file change is always a capture, en passant included.
            if changes_file {
                san.push(file_char(mv.from));
                san.push('x');
            }
            san.push_str(&to);
            if let Some(promo) = mv.promo {
                san.push('=');
                san.push(promo.to_char().to_ascii_uppercase());
            }
            san
        }
        kind => {
            let mut san = String::new();
            san.push(kind.to_char().to_ascii_uppercase());
            san.push_str(&disambiguation(pos, mv, kind));
            if pos.piece_at(mv.to).is_some() {
                san.push('x');
            }
            san.push_str(&to);
            san
        }
    }
}

/// File, rank or both of the origin when another piece of the same kind
/// can legally reach the same square.
fn disambiguation(pos: &Position, mv: Move, kind: PieceKind) -> String {
    let rivals: Vec<u8> = legal_moves(pos)
        .into_iter()
        .filter(|m| m.to == mv.to && m.from != mv.from)
        .filter(|m| pos.piece_at(m.from).is_some_and(|p| p.kind == kind))
        .map(|m| m.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    let same_file = rivals.iter().any(|&s| file_of(s) == file_of(mv.from));
    let same_rank = rivals.iter().any(|&s| rank_of(s) == rank_of(mv.from));

    match (same_file, same_rank) {
        (false, _) => file_char(mv.from).to_string(),
        (true, false) => rank_char(mv.from).to_string(),
        (true, true) => sq_to_coord(mv.from),
    }
}

fn file_char(sq: u8) -> char {
    (b'a' + sq % 8) as char
}

fn rank_char(sq: u8) -> char {
    (b'1' + sq / 8) as char
}

#[cfg(test)]
#[path = "san_tests.rs"]
mod san_tests;
