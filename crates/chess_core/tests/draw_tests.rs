//! Tests for game-ending conditions through the public API
//!
//! - Stalemate
//! - Checkmate vs. plain check
//! - Fifty-move rule
//! - Threefold repetition (position signatures)

use chess_core::{
    legal_moves, legal_moves_into, terminal_status, Color, Game, Move, PieceKind, Position,
    TerminalStatus,
};

fn fen(s: &str) -> Position {
    Position::from_fen(s).unwrap_or_else(|e| panic!("bad FEN {s}: {e}"))
}

// =============================================================================
// Stalemate Tests
// =============================================================================

#[test]
fn test_stalemate_king_in_corner() {
    // Black king on a8, white queen on b6, white king on c7
    let pos = fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");

    let mut moves = Vec::new();
    legal_moves_into(&pos, &mut moves);

    assert!(moves.is_empty(), "Stalemate position should have no legal moves");
    assert!(!pos.in_check(Color::Black), "Stalemate means king is not in check");
    assert_eq!(terminal_status(&pos, &[pos.signature()]), TerminalStatus::Stalemate);
}

#[test]
fn test_stalemate_king_and_pawn_endgame() {
    let pos = fen("6k1/6P1/6K1/8/8/8/8/8 b - - 0 1");

    assert!(legal_moves(&pos).is_empty());
    assert_eq!(terminal_status(&pos, &[pos.signature()]), TerminalStatus::Stalemate);
}

// =============================================================================
// Checkmate Tests
// =============================================================================

#[test]
fn test_checkmate_is_not_stalemate() {
    // Scholar's mate
    let pos = fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");

    assert!(legal_moves(&pos).is_empty());
    assert!(pos.in_check(Color::Black), "Checkmate means king IS in check");
    assert_eq!(
        terminal_status(&pos, &[pos.signature()]),
        TerminalStatus::Checkmate {
            winner: Color::White
        }
    );
}

#[test]
fn test_check_is_not_checkmate() {
    let pos = fen("rnbqkbnr/ppppp1pp/8/5p1Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 1 2");

    assert!(!legal_moves(&pos).is_empty(), "Check position should have legal moves");
    assert!(pos.in_check(Color::Black));
    assert_eq!(terminal_status(&pos, &[pos.signature()]), TerminalStatus::InProgress);
}

// =============================================================================
// Fifty-Move Rule Tests
// =============================================================================

#[test]
fn test_fifty_move_rule_at_100_halfmoves() {
    let pos = fen("8/8/8/4k3/8/4K3/8/8 w - - 100 60");
    assert!(pos.is_fifty_move_draw());
    assert_eq!(terminal_status(&pos, &[pos.signature()]), TerminalStatus::FiftyMove);
}

#[test]
fn test_fifty_move_rule_at_99_halfmoves() {
    let pos = fen("8/8/8/4k3/8/4K3/8/8 w - - 99 60");
    assert!(!pos.is_fifty_move_draw());
}

#[test]
fn test_fifty_move_rule_reset_on_pawn_move() {
    let pos = fen("8/8/8/4k3/8/3K4/4P3/8 w - - 99 60");

    let pawn_move = legal_moves(&pos)
        .into_iter()
        .find(|m| pos.piece_at(m.from).is_some_and(|p| p.kind == PieceKind::Pawn))
        .expect("Should have a pawn move available");
    let next = pos.apply(pawn_move).unwrap();

    assert!(!next.is_fifty_move_draw());
    assert_eq!(next.halfmove_clock, 0, "Halfmove clock should be 0 after pawn move");
}

#[test]
fn test_fifty_move_rule_reset_on_capture() {
    let pos = fen("8/8/8/4k3/8/3K4/8/r6R w - - 99 60");
    let next = pos.apply(Move::from_uci("h1a1").unwrap()).unwrap();
    assert_eq!(next.halfmove_clock, 0);
}

#[test]
fn test_ninety_nine_plus_quiet_move_is_draw() {
    let mut game = Game::from_position(fen("8/8/8/4k3/8/3K4/8/7R w - - 99 60"));
    assert_eq!(game.status(), TerminalStatus::InProgress);
    game.apply_uci("h1h2").unwrap();
    assert_eq!(game.status(), TerminalStatus::FiftyMove);
}

// =============================================================================
// Position Signature Tests (for threefold repetition)
// =============================================================================

#[test]
fn test_signature_same_position() {
    assert_eq!(Position::startpos().signature(), Position::startpos().signature());
}

#[test]
fn test_signature_different_side_to_move() {
    let pos1 = fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    let pos2 = fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1");
    assert_ne!(pos1.signature(), pos2.signature());
}

#[test]
fn test_signature_different_castling_rights() {
    let pos1 = fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    let pos2 = fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Kq - 0 1");
    assert_ne!(pos1.signature(), pos2.signature());
}

#[test]
fn test_signature_different_en_passant() {
    let pos1 = fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
    let pos2 = fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
    assert_ne!(pos1.signature(), pos2.signature());
}

#[test]
fn test_threefold_repetition_through_knight_shuffle() {
    // Both knights leave and return twice; the start position is the first
    // to be seen a third time.
    let mut game = Game::new();
    let target = game.position().signature();

    let shuffle = ["g1f3", "b8c6", "f3g1", "c6b8"];
    for round in 0..2 {
        for (i, m) in shuffle.iter().enumerate() {
            game.apply_uci(m).unwrap();
            let done = round == 1 && i == shuffle.len() - 1;
            assert_eq!(game.status().is_over(), done, "round {round}, move {m}");
        }
    }

    let count = game.history().iter().filter(|s| **s == target).count();
    assert_eq!(count, 3);
    assert_eq!(game.status(), TerminalStatus::Repetition);
}

#[test]
fn test_repetition_counts_positions_not_moves() {
    // After 1.e4 e5 2.Nf3 Nc6, "Nf3 with Black to move" recurs first: its
    // third occurrence comes at the second return of the king's knight.
    let mut game = Game::new();
    for m in ["e2e4", "e7e5", "g1f3", "b8c6"] {
        game.apply_uci(m).unwrap();
    }
    for m in ["f3g1", "c6b8", "g1f3", "b8c6", "f3g1", "c6b8"] {
        game.apply_uci(m).unwrap();
        assert_eq!(game.status(), TerminalStatus::InProgress, "{m}");
    }
    game.apply_uci("g1f3").unwrap();
    assert_eq!(game.status(), TerminalStatus::Repetition);
}
