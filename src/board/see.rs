use super::bitboard::BitBoard;
use super::chessmove::Move;
use super::piece::Piece;
use super::position::Position;

/// Exchange values per piece type. The king is effectively priceless; it can
/// end a sequence but never profitably be given up.
pub const SEE_VALUE: [i32; 6] = [100, 300, 300, 500, 950, 15_000];

#[inline]
pub fn see_value(piece: Piece) -> i32 {
    SEE_VALUE[piece.index()]
}

/// Cheap victim-minus-attacker estimate of a capture. Non-negative means the
/// capture cannot lose material outright; negative means the full swap
/// evaluation is worth running.
pub fn exchange_hint(position: &Position, mv: Move) -> i32 {
    let attacker = match position.piece_on(mv.from()) {
        Some(p) => p,
        None => return 0,
    };
    let victim = if position.is_en_passant(mv) {
        Piece::Pawn
    } else {
        match position.piece_on(mv.to()) {
            Some(p) => p,
            None => return 0,
        }
    };
    see_value(victim) - see_value(attacker)
}

/// Static exchange evaluation of `mv`: the material outcome for the mover
/// assuming both sides keep capturing on the destination square while it
/// stays profitable, with x-ray attackers joining as blockers peel away.
pub fn see(position: &Position, mv: Move) -> i32 {
    let to = mv.to();
    let from = mv.from();

    let mover = match position.piece_on(from) {
        Some(p) => p,
        None => return 0,
    };
    let us = match position.color_on(from) {
        Some(c) => c,
        None => return 0,
    };

    let mut gain = [0i32; 32];
    gain[0] = if position.is_en_passant(mv) {
        see_value(Piece::Pawn)
    } else {
        position.piece_on(to).map_or(0, see_value)
    };

    // The piece now standing on the target square; a promotion puts the
    // promoted piece at risk, not the pawn.
    let mut at_risk = see_value(mv.promotion().unwrap_or(mover));

    let mut occupied = position.occupied() ^ BitBoard::from_square(from);
    let mut side = !us;
    let mut depth = 0usize;

    loop {
        let attackers = position.attackers_to(to, occupied);
        let side_attackers = attackers & position.by_color(side);
        if side_attackers.is_empty() || depth + 1 >= gain.len() {
            break;
        }

        depth += 1;
        gain[depth] = at_risk - gain[depth - 1];
        // Neither continuation can be profitable: stop expanding the swap.
        if gain[depth].max(-gain[depth - 1]) < 0 {
            break;
        }

        let (piece, sq) = least_valuable(position, side_attackers);
        at_risk = see_value(piece);
        occupied ^= BitBoard::from_square(sq);
        side = !side;
    }

    // Negamax rollup over the swap list: each side may decline to recapture.
    while depth > 0 {
        gain[depth - 1] = -(-gain[depth - 1]).max(gain[depth]);
        depth -= 1;
    }
    gain[0]
}

fn least_valuable(position: &Position, attackers: BitBoard) -> (Piece, super::square::Square) {
    for piece in Piece::ALL {
        let subset = position.by_piece(piece) & attackers;
        if subset.any() {
            return (piece, subset.first());
        }
    }
    // Unreachable for a non-empty attacker set; the pawn arm above fires first.
    (Piece::King, attackers.first())
}
