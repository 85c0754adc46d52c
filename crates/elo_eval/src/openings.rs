//! Short opening lines used to vary games.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Common opening lines as UCI moves from the start position.
pub const OPENINGS: &[&[&str]] = &[
    // Open games
    &["e2e4", "e7e5"],
    &["e2e4", "e7e5", "g1f3", "b8c6"],
    &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4"], // Italian
    &["e2e4", "e7e5", "g1f3", "b8c6", "d2d4"], // Scotch
    &["e2e4", "e7e5", "f1c4"],                 // Bishop's Opening
    // Sicilian
    &["e2e4", "c7c5"],
    &["e2e4", "c7c5", "g1f3", "d7d6"],
    // French, Caro-Kann
    &["e2e4", "e7e6"],
    &["e2e4", "c7c6"],
    // Closed games
    &["d2d4", "d7d5"],
    &["d2d4", "d7d5", "c2c4"], // Queen's Gambit
    // Indian systems
    &["d2d4", "g8f6"],
    &["d2d4", "g8f6", "c2c4", "g7g6"], // King's Indian
    &["d2d4", "g8f6", "c2c4", "e7e6"],
    // Flank openings
    &["c2c4", "e7e5"],
    &["g1f3", "d7d5"],
];

/// Picks opening lines at random. A fixed seed gives a repeatable sequence.
#[derive(Debug, Clone)]
pub struct OpeningBook {
    lines: Vec<Vec<String>>,
    rng: StdRng,
}

impl OpeningBook {
    /// The built-in lines.
    pub fn standard(seed: Option<u64>) -> Self {
        Self::from_lines(
            OPENINGS
                .iter()
                .map(|line| line.iter().map(|m| m.to_string()).collect())
                .collect(),
            seed,
        )
    }

    pub fn from_lines(lines: Vec<Vec<String>>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { lines, rng }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// A random line; empty when the book is.
    pub fn pick(&mut self) -> &[String] {
        self.lines
            .choose(&mut self.rng)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
