//! Minimal UCI engine that plays a random legal move.
//!
//! Advertises `UCI_LimitStrength` and `UCI_Elo` so it can stand in for a
//! reference engine in smoke runs; both options are accepted and ignored.

use chess_core::{legal_moves, move_to_uci, Game, Position};
use rand::seq::SliceRandom;
use std::io::{self, BufRead, Write};

fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut rng = rand::thread_rng();

    let mut game = Game::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "uci" => {
                writeln!(stdout, "id name RandomMover 0.1").ok();
                writeln!(stdout, "id author ML-chess").ok();
                writeln!(stdout, "option name UCI_LimitStrength type check default false").ok();
                writeln!(stdout, "option name UCI_Elo type spin default 1500 min 1000 max 2600").ok();
                writeln!(stdout, "uciok").ok();
                stdout.flush().ok();
            }
            "isready" => {
                writeln!(stdout, "readyok").ok();
                stdout.flush().ok();
            }
            "ucinewgame" => {
                game = Game::new();
            }
            "position" => {
                if let Some(g) = set_position(&parts[1..]) {
                    game = g;
                }
            }
            "go" => {
                let moves = legal_moves(game.position());
                match moves.choose(&mut rng) {
                    Some(&mv) => writeln!(stdout, "bestmove {}", move_to_uci(mv)).ok(),
                    None => writeln!(stdout, "bestmove 0000").ok(),
                };
                stdout.flush().ok();
            }
            "quit" => break,
            _ => {
                // setoption and anything unknown
            }
        }
    }
}

/// `startpos [moves ...]` or `fen <fields> [moves ...]`.
fn set_position(args: &[&str]) -> Option<Game> {
    let moves_at = args.iter().position(|&a| a == "moves").unwrap_or(args.len());
    let mut game = match args.first()? {
        &"startpos" => Game::new(),
        &"fen" => {
            let pos = Position::from_fen(&args[1..moves_at].join(" ")).ok()?;
            Game::from_position(pos)
        }
        _ => return None,
    };
    for mv in args.iter().skip(moves_at + 1) {
        game.apply_uci(mv).ok()?;
    }
    Some(game)
}
