use std::fmt;

use crate::error::{FenError, IllegalMoveError};
use crate::movegen::legal_moves;
use crate::types::*;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub wk: bool,
    pub wq: bool,
    pub bk: bool,
    pub bq: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        wk: true,
        wq: true,
        bk: true,
        bq: true,
    };
    pub const NONE: CastlingRights = CastlingRights {
        wk: false,
        wq: false,
        bk: false,
        bq: false,
    };

    // A king or rook leaving its home square, or a rook being captured there,
    // removes the matching right.
    fn touch(&mut self, square: u8) {
        match square {
            0 => self.wq = false,
            7 => self.wk = false,
            56 => self.bq = false,
            63 => self.bk = false,
            4 => {
                self.wk = false;
                self.wq = false;
            }
            60 => {
                self.bk = false;
                self.bq = false;
            }
            _ => {}
        }
    }
}

/// Canonical repetition key: placement, side to move, castling rights and
/// en-passant target. Move counters are deliberately absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    board: [Option<Piece>; 64],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<u8>,
}

/// A chess position. Values are never mutated in place by the public API:
/// [`Position::apply`] returns the successor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub board: [Option<Piece>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>, // square behind a pawn that just advanced 2
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl Position {
    pub fn startpos() -> Self {
        let mut p = Position {
            board: [None; 64],
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        };

        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, &kind) in back.iter().enumerate() {
            p.board[f] = Some(Piece::new(Color::White, kind));
            p.board[8 + f] = Some(Piece::new(Color::White, PieceKind::Pawn));
            p.board[48 + f] = Some(Piece::new(Color::Black, PieceKind::Pawn));
            p.board[56 + f] = Some(Piece::new(Color::Black, kind));
        }
        p
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::MissingFields(parts.len()));
        }

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }

        let mut board = [None; 64];
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let mut file: i8 = 0;
            let rank: i8 = 7 - rank_idx as i8; // FEN lists rank 8 .. 1
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    file += d as i8;
                } else {
                    let kind = PieceKind::from_char(ch).ok_or(FenError::Piece(ch))?;
                    let color = if ch.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let s = sq(file, rank).ok_or(FenError::RankWidth { rank: rank_idx })?;
                    board[s as usize] = Some(Piece::new(color, kind));
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::RankWidth { rank: rank_idx });
                }
            }
            if file != 8 {
                return Err(FenError::RankWidth { rank: rank_idx });
            }
        }

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        let mut castling = CastlingRights::NONE;
        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => castling.wk = true,
                    'Q' => castling.wq = true,
                    'k' => castling.bk = true,
                    'q' => castling.bq = true,
                    _ => return Err(FenError::Castling(c)),
                }
            }
        }

        let en_passant = match parts[3] {
            "-" => None,
            coord => Some(coord_to_sq(coord).ok_or_else(|| FenError::EnPassant(coord.to_string()))?),
        };

        let counter = |text: Option<&&str>, default: u32| -> Result<u32, FenError> {
            match text {
                Some(t) => t.parse().map_err(|_| FenError::Counter(t.to_string())),
                None => Ok(default),
            }
        };
        let halfmove_clock = counter(parts.get(4), 0)?;
        let fullmove_number = counter(parts.get(5), 1)?;

        let pos = Position {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        };

        for color in [Color::White, Color::Black] {
            let count = pos
                .board
                .iter()
                .flatten()
                .filter(|pc| pc.color == color && pc.kind == PieceKind::King)
                .count();
            if count != 1 {
                return Err(FenError::KingCount { color, count });
            }
        }

        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[rank * 8 + file] {
                    Some(pc) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(pc.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        let c = self.castling;
        if c == CastlingRights::NONE {
            out.push('-');
        } else {
            for (flag, ch) in [(c.wk, 'K'), (c.wq, 'Q'), (c.bk, 'k'), (c.bq, 'q')] {
                if flag {
                    out.push(ch);
                }
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(s) => out.push_str(&sq_to_coord(s)),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }

    pub fn signature(&self) -> Signature {
        Signature {
            board: self.board,
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.en_passant,
        }
    }

    pub fn king_sq(&self, c: Color) -> Option<u8> {
        (0..64u8).find(|&i| self.board[i as usize] == Some(Piece::new(c, PieceKind::King)))
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.board[sq as usize]
    }

    fn set_piece(&mut self, sq: u8, pc: Option<Piece>) {
        self.board[sq as usize] = pc;
    }

    pub fn in_check(&self, c: Color) -> bool {
        match self.king_sq(c) {
            Some(ksq) => self.is_square_attacked(ksq, c.other()),
            None => false,
        }
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    pub fn is_square_attacked(&self, target: u8, by: Color) -> bool {
        let tf = file_of(target);
        let tr = rank_of(target);

        // A pawn attacks the target from one rank behind it (from the attacker's view).
        let pawn_dirs: &[(i8, i8)] = match by {
            Color::White => &[(-1, -1), (1, -1)],
            Color::Black => &[(-1, 1), (1, 1)],
        };
        let attacked_by = |dirs: &[(i8, i8)], kind: PieceKind| {
            dirs.iter().any(|(df, dr)| {
                sq(tf + df, tr + dr)
                    .and_then(|s| self.piece_at(s))
                    .is_some_and(|pc| pc.color == by && pc.kind == kind)
            })
        };
        if attacked_by(pawn_dirs, PieceKind::Pawn)
            || attacked_by(&KNIGHT_DELTAS[..], PieceKind::Knight)
            || attacked_by(&KING_DELTAS[..], PieceKind::King)
        {
            return true;
        }

        let slides = |dirs: &[(i8, i8)], kind: PieceKind| {
            dirs.iter().any(|(df, dr)| {
                let mut f = tf + df;
                let mut r = tr + dr;
                while let Some(s) = sq(f, r) {
                    if let Some(pc) = self.piece_at(s) {
                        return pc.color == by && (pc.kind == kind || pc.kind == PieceKind::Queen);
                    }
                    f += df;
                    r += dr;
                }
                false
            })
        };
        slides(&DIAGONALS[..], PieceKind::Bishop) || slides(&ORTHOGONALS[..], PieceKind::Rook)
    }

    /// Returns the successor position, or an error if `mv` is not legal here.
    pub fn apply(&self, mv: Move) -> Result<Position, IllegalMoveError> {
        if !legal_moves(self).contains(&mv) {
            return Err(IllegalMoveError {
                text: mv.to_string(),
                side: self.side_to_move,
            });
        }
        let mut next = self.clone();
        next.play_unchecked(mv);
        Ok(next)
    }

    /// Plays a pseudo-legal move on `self` without checking legality.
    /// Castling, en passant and captures are derived from the board.
    pub(crate) fn play_unchecked(&mut self, mv: Move) {
        let from = mv.from;
        let to = mv.to;
        let Some(moved) = self.piece_at(from) else {
            return;
        };
        let captured = self.piece_at(to);
        let ep_target = self.en_passant.take();

        let is_pawn = moved.kind == PieceKind::Pawn;
        let is_en_passant =
            is_pawn && file_of(from) != file_of(to) && captured.is_none() && ep_target == Some(to);
        let is_castle = moved.kind == PieceKind::King && (file_of(to) - file_of(from)).abs() == 2;

        if is_en_passant {
            // The captured pawn sits beside the mover, on the destination file.
            if let Some(cs) = sq(file_of(to), rank_of(from)) {
                self.set_piece(cs, None);
            }
        }

        self.set_piece(from, None);
        let promoted = if is_pawn && (rank_of(to) == 0 || rank_of(to) == 7) {
            Piece::new(moved.color, mv.promo.unwrap_or(PieceKind::Queen))
        } else {
            moved
        };
        self.set_piece(to, Some(promoted));

        if is_castle {
            let (rook_from, rook_to) = if to > from {
                (from + 3, from + 1)
            } else {
                (from - 4, from - 1)
            };
            let rook = self.piece_at(rook_from);
            self.set_piece(rook_from, None);
            self.set_piece(rook_to, rook);
        }

        self.castling.touch(from);
        self.castling.touch(to);

        if is_pawn && (rank_of(to) - rank_of(from)).abs() == 2 {
            self.en_passant = sq(file_of(from), (rank_of(from) + rank_of(to)) / 2);
        }

        self.halfmove_clock = if is_pawn || captured.is_some() {
            0
        } else {
            self.halfmove_clock + 1
        };

        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.other();
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

pub(crate) const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (-1, 2),
    (-2, 1),
    (1, -2),
    (2, -1),
    (-1, -2),
    (-2, -1),
];

pub(crate) const KING_DELTAS: [(i8, i8); 8] = [
    (1, 1),
    (1, 0),
    (1, -1),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
