use arrayvec::ArrayVec;

use crate::board::{exchange_hint, see, Move, MoveGen, Position};
use crate::params::SearchParameters;
use crate::pst::MVV_VALUE;
use crate::types::Score;

/// Ordering bands. Every move gets a score in exactly one band, so a single
/// partial selection sort yields the spec'd phases in order: winning or
/// equal captures and promotions, killers, quiets by history, losing
/// captures last.
const GOOD_CAPTURE: Score = 4_000_000;
const KILLER_ONE: Score = 3_000_000;
const KILLER_TWO: Score = 2_900_000;
const QUIET: Score = 1_000_000;
const LOSING_CAPTURE: Score = 0;

struct ScoredMove {
    mv: Move,
    score: Score,
    quiet: bool,
}

/// Stateful ordered iterator over the legal moves of one node.
///
/// The hash move is excluded entirely; the TT probe searches it before the
/// move loop starts. Moves are drawn with a partial selection sort so a node
/// that cuts off after two moves never pays to rank the rest. Quiet moves
/// are logged as they are yielded so a cutoff can walk back and penalize the
/// ones that were tried first and failed.
pub struct MovePicker {
    moves: ArrayVec<ScoredMove, 256>,
    index: usize,
    yielded_quiets: ArrayVec<Move, 256>,
    reducible: bool,
}

impl MovePicker {
    pub fn new(
        position: &Position,
        params: &SearchParameters,
        hash_move: Option<Move>,
        is_pv_node: bool,
        in_check: bool,
    ) -> Self {
        let killers = if params.ply < params.killers.len() {
            params.killers[params.ply]
        } else {
            [None; 2]
        };

        let mut moves: ArrayVec<ScoredMove, 256> = ArrayVec::new();
        for mv in MoveGen::new(position) {
            if Some(mv) == hash_move {
                continue;
            }

            let capture = position.is_capture(mv);
            let (score, quiet) = if capture {
                let tactical = mvv_lva(position, mv);
                // Only run the full swap evaluation on captures the cheap
                // hint already flags as suspect.
                if exchange_hint(position, mv) < 0 && see(position, mv) < 0 {
                    (LOSING_CAPTURE + tactical, false)
                } else {
                    (GOOD_CAPTURE + tactical, false)
                }
            } else if let Some(promo) = mv.promotion() {
                (GOOD_CAPTURE + MVV_VALUE[promo.index()] * 10, false)
            } else if killers[0] == Some(mv) {
                (KILLER_ONE, true)
            } else if killers[1] == Some(mv) {
                (KILLER_TWO, true)
            } else {
                let history = match (position.piece_on(mv.from()), position.color_on(mv.from())) {
                    (Some(piece), Some(color)) => params.history(color, piece, mv.to()),
                    _ => 0,
                };
                (QUIET + history, true)
            };

            moves.push(ScoredMove { mv, score, quiet });
        }

        MovePicker {
            moves,
            index: 0,
            yielded_quiets: ArrayVec::new(),
            reducible: !in_check && !is_pv_node,
        }
    }

    /// Reductions and futility pruning are allowed here: quiet node, not on
    /// the principal variation.
    #[inline]
    pub fn node_is_reducible(&self) -> bool {
        self.reducible
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Partial selection sort: swap the best remaining move into place and
    /// yield it.
    pub fn next(&mut self) -> Option<Move> {
        if self.index >= self.moves.len() {
            return None;
        }

        let mut best = self.index;
        for i in self.index + 1..self.moves.len() {
            if self.moves[i].score > self.moves[best].score {
                best = i;
            }
        }
        self.moves.swap(self.index, best);

        let picked = &self.moves[self.index];
        let mv = picked.mv;
        if picked.quiet {
            let _ = self.yielded_quiets.try_push(mv);
        }
        self.index += 1;
        Some(mv)
    }

    /// After a cutoff, drain value from the quiet moves that were tried
    /// before the winner so they sink in future orderings.
    pub fn reduce_bad_histories(
        &self,
        position: &Position,
        params: &mut SearchParameters,
        depth: i32,
        best: Move,
    ) {
        for &mv in &self.yielded_quiets {
            if mv == best {
                continue;
            }
            if let (Some(piece), Some(color)) =
                (position.piece_on(mv.from()), position.color_on(mv.from()))
            {
                params.punish_history(color, piece, mv.to(), depth);
            }
        }
    }
}

/// Most-valuable-victim / least-valuable-attacker ordering score.
pub fn mvv_lva(position: &Position, mv: Move) -> Score {
    let victim = if position.is_en_passant(mv) {
        0 // pawn
    } else {
        match position.piece_on(mv.to()) {
            Some(p) => p.index(),
            None => return 0,
        }
    };
    let attacker = position.piece_on(mv.from()).map_or(0, |p| p.index());
    let mut score = MVV_VALUE[victim] * 10 - attacker as Score;
    if let Some(promo) = mv.promotion() {
        score += MVV_VALUE[promo.index()] * 10;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, Square};
    use std::str::FromStr;

    fn drain(picker: &mut MovePicker) -> Vec<Move> {
        let mut out = Vec::new();
        while let Some(mv) = picker.next() {
            out.push(mv);
        }
        out
    }

    #[test]
    fn yields_every_legal_move_once() {
        let pos = Position::default();
        let params = SearchParameters::new();
        let mut picker = MovePicker::new(&pos, &params, None, true, false);
        let moves = drain(&mut picker);
        assert_eq!(moves.len(), 20);
        let mut dedup = moves.clone();
        dedup.sort_by_key(|m| (m.from().index(), m.to().index()));
        dedup.dedup();
        assert_eq!(dedup.len(), 20);
    }

    #[test]
    fn hash_move_is_excluded() {
        let pos = Position::default();
        let params = SearchParameters::new();
        let hash_move = Move::new(Square::new(12), Square::new(28), None); // e2e4
        let mut picker = MovePicker::new(&pos, &params, Some(hash_move), true, false);
        let moves = drain(&mut picker);
        assert_eq!(moves.len(), 19);
        assert!(!moves.contains(&hash_move));
    }

    #[test]
    fn winning_capture_comes_before_quiets() {
        // White can win a queen with exd5.
        let pos = Position::from_str("rnb1kbnr/pppp1ppp/8/3q4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1")
            .unwrap();
        let params = SearchParameters::new();
        let mut picker = MovePicker::new(&pos, &params, None, true, false);
        let first = picker.next().unwrap();
        assert_eq!(first.to(), Square::new(35)); // d5
        assert!(pos.is_capture(first));
    }

    #[test]
    fn losing_capture_comes_last() {
        // Rook can grab a pawn defended by a pawn; every quiet move should
        // be tried before that capture.
        let pos = Position::from_str("4k3/2p5/3p4/8/8/8/8/3RK3 w - - 0 1").unwrap();
        let params = SearchParameters::new();
        let rxd6 = Move::new(Square::new(3), Square::new(43), None);
        assert!(see(&pos, rxd6) < 0);

        let mut picker = MovePicker::new(&pos, &params, None, true, false);
        let moves = drain(&mut picker);
        assert_eq!(moves.last(), Some(&rxd6));
    }

    #[test]
    fn killer_ranks_above_plain_quiets() {
        let pos = Position::default();
        let mut params = SearchParameters::new();
        let killer = Move::new(Square::new(6), Square::new(21), None); // g1f3
        params.record_killer(killer);

        let mut picker = MovePicker::new(&pos, &params, None, false, false);
        assert_eq!(picker.next(), Some(killer));
    }

    #[test]
    fn history_orders_quiets() {
        let pos = Position::default();
        let mut params = SearchParameters::new();
        let boosted = Move::new(Square::new(11), Square::new(27), None); // d2d4
        params.reward_history(crate::board::Color::White, Piece::Pawn, boosted.to(), 9);

        let mut picker = MovePicker::new(&pos, &params, None, true, false);
        assert_eq!(picker.next(), Some(boosted));
    }

    #[test]
    fn reducible_only_when_quiet_non_pv() {
        let pos = Position::default();
        let params = SearchParameters::new();
        assert!(MovePicker::new(&pos, &params, None, false, false).node_is_reducible());
        assert!(!MovePicker::new(&pos, &params, None, true, false).node_is_reducible());
        assert!(!MovePicker::new(&pos, &params, None, false, true).node_is_reducible());
    }

    #[test]
    fn bad_history_reduction_spares_the_best_move() {
        let pos = Position::default();
        let mut params = SearchParameters::new();
        let mut picker = MovePicker::new(&pos, &params, None, false, false);

        let first = picker.next().unwrap();
        let second = picker.next().unwrap();

        // Seed both with some history, then penalize everything tried
        // before `second` won the node.
        for mv in [first, second] {
            params.reward_history(crate::board::Color::White, pos.piece_on(mv.from()).unwrap(), mv.to(), 4);
        }
        picker.reduce_bad_histories(&pos, &mut params, 4, second);

        let first_piece = pos.piece_on(first.from()).unwrap();
        let second_piece = pos.piece_on(second.from()).unwrap();
        assert_eq!(params.history(crate::board::Color::White, first_piece, first.to()), 0);
        assert_eq!(params.history(crate::board::Color::White, second_piece, second.to()), 16);
    }
}
