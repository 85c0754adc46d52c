//! Chess rules for refereeing engine games.
//!
//! Positions are immutable values: legality is checked by simulating a move
//! on a copy and testing whether the mover's king is attacked. [`Game`]
//! tracks the position, the played moves and the repetition history, and
//! [`terminal_status`] decides when a game is over.

pub mod board;
pub mod error;
pub mod game;
pub mod movegen;
pub mod perft;
pub mod san;
pub mod types;
pub mod uci;

pub use board::*;
pub use error::*;
pub use game::*;
pub use movegen::*;
pub use perft::perft;
pub use san::*;
pub use types::*;
pub use uci::*;
