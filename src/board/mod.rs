mod attacks;
mod bitboard;
mod chessmove;
mod magic;
mod movegen;
mod piece;
mod position;
mod see;
mod square;
mod zobrist;

pub use bitboard::{BitBoard, EMPTY};
pub use chessmove::Move;
pub use movegen::MoveGen;
pub use piece::{Color, Piece};
pub use position::{GameStatus, Position};
pub use see::{exchange_hint, see, see_value};
pub use square::{File, Rank, Square, ALL_SQUARES};

/// Build the attack and hashing tables eagerly. Everything also lazily
/// initializes on first use; calling this at startup just front-loads the
/// magic search.
pub fn init() {
    attacks::init();
    zobrist::init();
}
