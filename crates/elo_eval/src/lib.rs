//! Rating evaluation for UCI chess engines
//!
//! This crate provides:
//! - A UCI process wrapper with bounded waits on every reply
//! - A refereed game runner and a match runner with color alternation
//! - A performance-rating estimator under the logistic Elo model
//! - Adaptive, linear and binary-search strategies for picking the
//!   reference rating of each match
//! - Optional PGN logs of every game played
//!
//! # Usage
//!
//! ```bash
//! # 6 matches of 10 games at 100 ms per move against Stockfish
//! cargo run -p elo_eval --release -- ./my_engine --matches 6 --games 10 --movetime 100
//!
//! # Binary search over a fixed range, settings from a file
//! cargo run -p elo_eval -- --config eval.toml --strategy bsearch --min-elo 1200 --max-elo 2400
//! ```

mod config;
mod error;
mod estimator;
mod evaluate;
mod game;
mod match_runner;
mod openings;
mod pgn;
mod strategy;
mod time_control;
mod uci_process;

pub use config::*;
pub use error::*;
pub use estimator::*;
pub use evaluate::*;
pub use game::*;
pub use match_runner::*;
pub use openings::*;
pub use pgn::*;
pub use strategy::*;
pub use time_control::*;
pub use uci_process::*;
