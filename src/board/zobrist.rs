use std::sync::LazyLock;

/// Keys for incremental position hashing: one per (piece, color, square),
/// one for the side to move, one per castling-rights nibble, one per
/// en-passant file.
struct Keys {
    piece: [[[u64; 64]; 2]; 6],
    side: u64,
    castling: [u64; 16],
    ep: [u64; 8],
}

static KEYS: LazyLock<Keys> = LazyLock::new(|| {
    // Fixed seed: every run hashes identically, which keeps the table and
    // repetition detection reproducible under a debugger.
    let mut rng = XorShift64(0x9E37_79B9_7F4A_7C15);

    let mut piece = [[[0u64; 64]; 2]; 6];
    for per_piece in &mut piece {
        for per_color in per_piece {
            for key in per_color {
                *key = rng.next();
            }
        }
    }

    let side = rng.next();

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = rng.next();
    }

    let mut ep = [0u64; 8];
    for key in &mut ep {
        *key = rng.next();
    }

    Keys { piece, side, castling, ep }
});

pub fn init() {
    LazyLock::force(&KEYS);
}

#[inline]
pub fn piece_key(piece: usize, color: usize, sq: usize) -> u64 {
    KEYS.piece[piece][color][sq]
}

#[inline]
pub fn side_key() -> u64 {
    KEYS.side
}

#[inline]
pub fn castling_key(rights: u8) -> u64 {
    KEYS.castling[rights as usize & 0xF]
}

#[inline]
pub fn ep_key(file: usize) -> u64 {
    KEYS.ep[file]
}

struct XorShift64(u64);

impl XorShift64 {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_nonzero() {
        init();
        assert_ne!(piece_key(0, 0, 0), 0);
        assert_ne!(side_key(), 0);
        assert_ne!(castling_key(0b1111), 0);
        assert_ne!(ep_key(0), 0);
    }

    #[test]
    fn keys_distinct() {
        init();
        let k1 = piece_key(0, 0, 0);
        assert_ne!(k1, piece_key(0, 0, 1));
        assert_ne!(k1, piece_key(1, 0, 0));
        assert_ne!(k1, piece_key(0, 1, 0));
    }

    #[test]
    fn xor_is_self_inverse() {
        init();
        let mut hash = 0u64;
        let key = piece_key(3, 0, 28);
        hash ^= key;
        hash ^= key;
        assert_eq!(hash, 0);
    }
}
