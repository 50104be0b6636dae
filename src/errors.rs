use thiserror::Error;

/// Errors from FEN parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("FEN needs at least 4 fields, got {0}")]
    MissingFields(usize),
    #[error("invalid piece character {0:?}")]
    InvalidPiece(char),
    #[error("piece placement runs off the board")]
    PlacementOutOfBounds,
    #[error("invalid side to move {0:?}")]
    InvalidSideToMove(String),
    #[error("invalid castling character {0:?}")]
    InvalidCastling(char),
}

/// Errors from parsing a UCI-format move string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("move string too short: {0:?}")]
    TooShort(String),
    #[error("square out of range in {0:?}")]
    BadSquare(String),
    #[error("move {0:?} is not legal in this position")]
    Illegal(String),
}
