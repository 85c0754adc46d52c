use thiserror::Error;

/// A move that is not in the legal move list of the position it was played in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal move `{text}` by {side:?}")]
pub struct IllegalMoveError {
    /// The move as it was received (UCI text or formatted move).
    pub text: String,
    /// The side that attempted the move.
    pub side: crate::Color,
}

/// Errors raised while parsing Forsyth-Edwards Notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected at least 4 FEN fields, found {0}")]
    MissingFields(usize),
    #[error("expected 8 ranks in board field, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not describe exactly 8 files")]
    RankWidth { rank: usize },
    #[error("invalid piece character `{0}`")]
    Piece(char),
    #[error("invalid side to move `{0}`")]
    SideToMove(String),
    #[error("invalid castling character `{0}`")]
    Castling(char),
    #[error("invalid en-passant square `{0}`")]
    EnPassant(String),
    #[error("invalid move counter `{0}`")]
    Counter(String),
    #[error("{color:?} must have exactly one king, found {count}")]
    KingCount { color: crate::Color, count: usize },
}
