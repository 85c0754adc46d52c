use crate::board::{DIAGONALS, KING_DELTAS, KNIGHT_DELTAS, ORTHOGONALS, Position};
use crate::types::*;

/// Generate all legal moves, returning a freshly allocated vector.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut out = Vec::with_capacity(64);
    legal_moves_into(pos, &mut out);
    out
}

/// Generate all legal moves into the provided buffer, reusing it across calls.
///
/// Each pseudo-legal move is played on a copy of `pos`; moves that leave the
/// mover's king attacked are dropped.
pub fn legal_moves_into(pos: &Position, out: &mut Vec<Move>) {
    out.clear();
    pseudo_moves(pos, out);
    out.retain(|&mv| leaves_king_safe(pos, mv));
}

/// True if the side to move has at least one legal move.
pub fn has_legal_move(pos: &Position) -> bool {
    let mut pseudo = Vec::with_capacity(64);
    pseudo_moves(pos, &mut pseudo);
    pseudo.into_iter().any(|mv| leaves_king_safe(pos, mv))
}

fn leaves_king_safe(pos: &Position, mv: Move) -> bool {
    let mover = pos.side_to_move;
    let mut next = pos.clone();
    next.play_unchecked(mv);
    !next.in_check(mover)
}

fn pseudo_moves(pos: &Position, out: &mut Vec<Move>) {
    for sq in 0..64u8 {
        let pc = match pos.piece_at(sq) {
            Some(p) if p.color == pos.side_to_move => p,
            _ => continue,
        };
        match pc.kind {
            PieceKind::Pawn => gen_pawn(pos, sq, pc.color, out),
            PieceKind::Knight => gen_steps(pos, sq, pc.color, out, &KNIGHT_DELTAS),
            PieceKind::Bishop => gen_slider(pos, sq, pc.color, out, &DIAGONALS),
            PieceKind::Rook => gen_slider(pos, sq, pc.color, out, &ORTHOGONALS),
            PieceKind::Queen => {
                gen_slider(pos, sq, pc.color, out, &DIAGONALS);
                gen_slider(pos, sq, pc.color, out, &ORTHOGONALS);
            }
            PieceKind::King => {
                gen_steps(pos, sq, pc.color, out, &KING_DELTAS);
                gen_castle(pos, sq, pc.color, out);
            }
        }
    }
}

fn push_pawn_move(from: u8, to: u8, promo_rank: i8, out: &mut Vec<Move>) {
    if rank_of(to) == promo_rank {
        for pk in PieceKind::PROMOTIONS {
            out.push(Move::with_promo(from, to, pk));
        }
    } else {
        out.push(Move::new(from, to));
    }
}

fn gen_pawn(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>) {
    let f = file_of(from);
    let r = rank_of(from);

    let (dir, start_rank, promo_rank): (i8, i8, i8) = match c {
        Color::White => (1, 1, 7),
        Color::Black => (-1, 6, 0),
    };

    // forward 1, then 2 from the start rank
    if let Some(to) = sq(f, r + dir)
        && pos.piece_at(to).is_none()
    {
        push_pawn_move(from, to, promo_rank, out);
        if r == start_rank
            && let Some(to2) = sq(f, r + 2 * dir)
            && pos.piece_at(to2).is_none()
        {
            out.push(Move::new(from, to2));
        }
    }

    // captures + en-passant
    for df in [-1, 1] {
        let Some(to) = sq(f + df, r + dir) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(tpc) if tpc.color != c => push_pawn_move(from, to, promo_rank, out),
            None if pos.en_passant == Some(to) => out.push(Move::new(from, to)),
            _ => {}
        }
    }
}

fn gen_steps(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>, deltas: &[(i8, i8)]) {
    let f = file_of(from);
    let r = rank_of(from);
    for (df, dr) in deltas {
        if let Some(to) = sq(f + df, r + dr) {
            match pos.piece_at(to) {
                Some(pc) if pc.color == c => {}
                _ => out.push(Move::new(from, to)),
            }
        }
    }
}

fn gen_slider(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>, dirs: &[(i8, i8)]) {
    let f0 = file_of(from);
    let r0 = rank_of(from);
    for (df, dr) in dirs {
        let mut f = f0 + df;
        let mut r = r0 + dr;
        while let Some(to) = sq(f, r) {
            match pos.piece_at(to) {
                None => out.push(Move::new(from, to)),
                Some(pc) if pc.color != c => {
                    out.push(Move::new(from, to));
                    break;
                }
                _ => break,
            }
            f += df;
            r += dr;
        }
    }
}

/// One castling option: right held, rook square, squares that must be empty,
/// and squares the king crosses (which must not be attacked).
struct CastleLane {
    allowed: bool,
    rook: u8,
    empty: &'static [u8],
    transit: &'static [u8],
    king_to: u8,
}

fn gen_castle(pos: &Position, from: u8, c: Color, out: &mut Vec<Move>) {
    let (king_home, lanes) = match c {
        Color::White => (
            4u8,
            [
                CastleLane {
                    allowed: pos.castling.wk,
                    rook: 7,
                    empty: &[5, 6],
                    transit: &[5, 6],
                    king_to: 6,
                },
                CastleLane {
                    allowed: pos.castling.wq,
                    rook: 0,
                    empty: &[1, 2, 3],
                    transit: &[3, 2],
                    king_to: 2,
                },
            ],
        ),
        Color::Black => (
            60u8,
            [
                CastleLane {
                    allowed: pos.castling.bk,
                    rook: 63,
                    empty: &[61, 62],
                    transit: &[61, 62],
                    king_to: 62,
                },
                CastleLane {
                    allowed: pos.castling.bq,
                    rook: 56,
                    empty: &[57, 58, 59],
                    transit: &[59, 58],
                    king_to: 58,
                },
            ],
        ),
    };
    if from != king_home {
        return;
    }

    // Can't castle out of check.
    if pos.in_check(c) {
        return;
    }

    let enemy = c.other();
    for lane in lanes {
        if lane.allowed
            && pos.piece_at(lane.rook) == Some(Piece::new(c, PieceKind::Rook))
            && lane.empty.iter().all(|&s| pos.piece_at(s).is_none())
            && lane.transit.iter().all(|&s| !pos.is_square_attacked(s, enemy))
        {
            out.push(Move::new(from, lane.king_to));
        }
    }
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
