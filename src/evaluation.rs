use crate::board::{Color, Position, ALL_SQUARES};
use crate::pst::{self, Taper, PHASE_WEIGHT, PIECE_VALUE, TEMPO, TOTAL_PHASE};
use crate::types::Score;

/// Upper bound on the positional (non-material) swing this evaluation can
/// produce between two reasonable positions. Sizes the futility and delta
/// pruning margins.
pub const MAX_POS_SCORE: Score = 200;

/// Game phase in `[0, TOTAL_PHASE]`: 24 with all pieces on the board,
/// 0 with bare kings. Promotions can push the raw sum past the top, so clamp.
pub fn phase(position: &Position) -> i32 {
    let mut phase = 0;
    for piece in crate::board::Piece::ALL {
        phase += position.by_piece(piece).popcnt() as i32 * PHASE_WEIGHT[piece.index()];
    }
    phase.min(TOTAL_PHASE)
}

/// Phase-blended material balance from White's perspective.
pub fn material(position: &Position) -> Score {
    let mut total = Taper::default();
    for piece in crate::board::Piece::ALL {
        let bb = position.by_piece(piece);
        let white = (bb & position.by_color(Color::White)).popcnt() as i16;
        let black = (bb & position.by_color(Color::Black)).popcnt() as i16;
        let value = PIECE_VALUE[piece.index()];
        total += pst::t(value.mg * (white - black), value.eg * (white - black));
    }
    total.blend(phase(position))
}

/// Phase-blended piece-square and tempo terms from White's perspective.
///
/// The PeSTO tables are laid out with a8 first; White squares flip ranks
/// (`sq ^ 56`), Black squares index directly, which mirrors the tables.
pub fn positional(position: &Position) -> Score {
    let mut total = Taper::default();
    for sq in ALL_SQUARES {
        if let Some(piece) = position.piece_on(sq) {
            match position.color_on(sq) {
                Some(Color::White) => total += pst::psqt(piece.index(), sq.index() ^ 56),
                Some(Color::Black) => total -= pst::psqt(piece.index(), sq.index()),
                None => {}
            }
        }
    }

    match position.side_to_move() {
        Color::White => total += TEMPO,
        Color::Black => total -= TEMPO,
    }

    total.blend(phase(position))
}

/// Full static evaluation from White's perspective. The search negates for
/// Black; quiescence calls the two halves separately to stand pat lazily.
pub fn evaluate(position: &Position) -> Score {
    material(position) + positional(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn startpos_is_balanced() {
        let pos = Position::default();
        assert_eq!(material(&pos), 0);
        let score = evaluate(&pos);
        assert!(score.abs() < 50, "startpos evaluated at {score}");
    }

    #[test]
    fn extra_queen_dominates() {
        let pos = Position::from_str("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .unwrap();
        assert!(evaluate(&pos) > 800, "queen-up eval {}", evaluate(&pos));
    }

    #[test]
    fn evaluation_is_white_relative() {
        // Black up a queen: negative from White's perspective regardless of
        // whose turn it is.
        let pos = Position::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR b KQkq - 0 1")
            .unwrap();
        assert!(evaluate(&pos) < -800);
        let pos = Position::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1")
            .unwrap();
        assert!(evaluate(&pos) < -800);
    }

    #[test]
    fn material_plus_positional_is_evaluate() {
        let pos = Position::from_str(
            "r1bq1rk1/pp2ppbp/2np2p1/2n5/P3PP2/N1P2N2/1PB3PP/R1B1QRK1 b - - 0 10",
        )
        .unwrap();
        assert_eq!(evaluate(&pos), material(&pos) + positional(&pos));
    }

    #[test]
    fn phase_endpoints() {
        assert_eq!(phase(&Position::default()), TOTAL_PHASE);
        let kings = Position::from_str("8/8/8/4k3/8/8/4K3/8 w - - 0 1").unwrap();
        assert_eq!(phase(&kings), 0);
    }

    #[test]
    fn pawn_endgame_favors_the_pawn() {
        let pos = Position::from_str("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert!(evaluate(&pos) > 0);
    }
}
