use crate::board::Move;
use crate::types::{Score, MATE_SCORE, MAX_PLY};

/// What the stored score means relative to the search window that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    /// Exact score: some move raised alpha without reaching beta.
    Pv,
    /// Lower bound: the node failed high at this score.
    Cut,
    /// Upper bound: no move raised alpha.
    All,
}

#[derive(Clone, Copy)]
pub struct Entry {
    pub key: u64,
    pub best_move: Option<Move>,
    pub score: i16,
    pub depth: u8,
    pub node_type: NodeType,
    /// Root move number of the search that wrote this entry.
    pub age: u8,
}

impl Default for Entry {
    fn default() -> Self {
        Self { key: 0, best_move: None, score: 0, depth: 0, node_type: NodeType::Pv, age: 0 }
    }
}

const BUCKET_SIZE: usize = 4;

/// Fixed-size, 4-way bucketed transposition table.
///
/// The bucket count is a power of two so the key maps with a mask. Within a
/// bucket, replacement picks the slot with the lowest retention score, a
/// single function combining depth-preferred and age-preferred replacement:
/// entries from an older search are heavily discounted, so the bucket always
/// keeps room for fresh results while deep current-search entries survive.
pub struct TranspositionTable {
    entries: Vec<Entry>,
    bucket_mask: usize,
    populated: usize,
}

impl TranspositionTable {
    /// Table sized to `mb` megabytes, rounded down to a power-of-two bucket
    /// count, never fewer than 1024 buckets.
    pub fn new(mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Entry>();
        let max_buckets = (mb * 1024 * 1024) / (entry_size * BUCKET_SIZE);
        let buckets = (max_buckets.next_power_of_two() / 2).max(1024);

        Self {
            entries: vec![Entry::default(); buckets * BUCKET_SIZE],
            bucket_mask: buckets - 1,
            populated: 0,
        }
    }

    #[inline]
    fn bucket_start(&self, key: u64) -> usize {
        (key as usize & self.bucket_mask) * BUCKET_SIZE
    }

    /// Look up `key`, returning a copy with any mate score translated to the
    /// probing ply. Only an exact key match counts; the caller still has to
    /// validate the hash move against the board (Type-1 collisions).
    pub fn probe(&self, key: u64, ply: usize) -> Option<Entry> {
        let start = self.bucket_start(key);
        for entry in &self.entries[start..start + BUCKET_SIZE] {
            if entry.key == key && entry.key != 0 {
                let mut found = *entry;
                found.score = unadjust_mate(found.score, ply);
                return Some(found);
            }
        }
        None
    }

    /// Insert an entry, adjusting mate scores to be root-relative so a hit at
    /// a different ply still means "mate in N from here".
    pub fn store(
        &mut self,
        key: u64,
        depth: u8,
        best_move: Option<Move>,
        score: Score,
        node_type: NodeType,
        age: u8,
        ply: usize,
    ) {
        let start = self.bucket_start(key);
        let mut victim = start;
        let mut victim_score = i32::MAX;

        for i in start..start + BUCKET_SIZE {
            let entry = &self.entries[i];
            if entry.key == 0 {
                victim = i;
                victim_score = i32::MIN;
                break;
            }
            if entry.key == key {
                victim = i;
                victim_score = i32::MIN;
                break;
            }
            // Retention score: deeper is worth keeping, stale age is not.
            let retention = entry.depth as i32 - if entry.age == age { 0 } else { 100 };
            if retention < victim_score {
                victim = i;
                victim_score = retention;
            }
        }

        let slot = &mut self.entries[victim];
        if slot.key == 0 {
            self.populated += 1;
        }

        // An all-node carries no move; keep the one already known for this
        // position rather than erasing it.
        let best_move = match best_move {
            Some(m) => Some(m),
            None if slot.key == key => slot.best_move,
            None => None,
        };

        *slot = Entry {
            key,
            best_move,
            score: adjust_mate(score, ply),
            depth,
            node_type,
            age,
        };
    }

    pub fn clear(&mut self) {
        self.entries.fill(Entry::default());
        self.populated = 0;
    }

    /// Populated share in per-mille, for the UCI `hashfull` field.
    pub fn hashfull(&self) -> usize {
        self.populated * 1000 / self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn populated(&self) -> usize {
        self.populated
    }
}

/// Mate scores are stored root-relative: a mate found at ply 5 and stored as
/// `MATE - k` would look one ply closer when probed at ply 7 otherwise.
#[inline]
fn adjust_mate(score: Score, ply: usize) -> i16 {
    let adjusted = if score >= MATE_SCORE - MAX_PLY as Score {
        score + ply as Score
    } else if score <= -MATE_SCORE + MAX_PLY as Score {
        score - ply as Score
    } else {
        score
    };
    adjusted as i16
}

#[inline]
fn unadjust_mate(score: i16, ply: usize) -> i16 {
    let score = score as Score;
    let adjusted = if score >= MATE_SCORE - MAX_PLY as Score {
        score - ply as Score
    } else if score <= -MATE_SCORE + MAX_PLY as Score {
        score + ply as Score
    } else {
        score
    };
    adjusted as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, Square};

    fn mv(from: u8, to: u8) -> Move {
        Move::new(Square::new(from), Square::new(to), None)
    }

    #[test]
    fn store_then_probe_roundtrip() {
        let mut tt = TranspositionTable::new(1);
        let key = 0x1234_5678_9ABC_DEF0;
        tt.store(key, 5, Some(mv(12, 28)), 100, NodeType::Pv, 7, 0);

        let entry = tt.probe(key, 0).expect("entry present");
        assert_eq!(entry.key, key);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.score, 100);
        assert_eq!(entry.node_type, NodeType::Pv);
        assert_eq!(entry.best_move, Some(mv(12, 28)));
        assert_eq!(entry.age, 7);
    }

    #[test]
    fn probe_miss_on_unknown_key() {
        let tt = TranspositionTable::new(1);
        assert!(tt.probe(0xDEAD_BEEF, 0).is_none());
    }

    #[test]
    fn mate_scores_are_ply_adjusted() {
        let mut tt = TranspositionTable::new(1);
        let key = 0xAB_CDEF;
        // Mate found three plies down, stored from ply 3.
        tt.store(key, 10, None, MATE_SCORE - 6, NodeType::Pv, 0, 3);

        // Probing at ply 5 sees the mate two plies further from the root.
        let entry = tt.probe(key, 5).unwrap();
        assert_eq!(entry.score as Score, MATE_SCORE - 8);

        // And at the storing ply, exactly what went in.
        let entry = tt.probe(key, 3).unwrap();
        assert_eq!(entry.score as Score, MATE_SCORE - 6);
    }

    #[test]
    fn same_key_is_overwritten_in_place() {
        let mut tt = TranspositionTable::new(1);
        let key = 0x12345;
        tt.store(key, 3, Some(mv(0, 8)), 50, NodeType::Cut, 0, 0);
        tt.store(key, 6, Some(mv(0, 16)), 75, NodeType::Pv, 0, 0);

        let entry = tt.probe(key, 0).unwrap();
        assert_eq!(entry.depth, 6);
        assert_eq!(entry.score, 75);
        assert_eq!(tt.populated(), 1);
    }

    #[test]
    fn all_node_store_keeps_known_move() {
        let mut tt = TranspositionTable::new(1);
        let key = 0x777;
        tt.store(key, 4, Some(mv(8, 16)), 30, NodeType::Cut, 0, 0);
        tt.store(key, 5, None, 10, NodeType::All, 0, 0);

        let entry = tt.probe(key, 0).unwrap();
        assert_eq!(entry.node_type, NodeType::All);
        assert_eq!(entry.best_move, Some(mv(8, 16)));
    }

    #[test]
    fn stale_entries_are_preferred_victims() {
        let mut tt = TranspositionTable::new(1);
        // Fill one bucket with four deep entries from an old search. Keys
        // must share the bucket index bits.
        let buckets = tt.capacity() / 4;
        let base = 0x42u64;
        for i in 0..4u64 {
            tt.store(base + i * buckets as u64, 20, None, 0, NodeType::All, 1, 0);
        }
        // A shallow entry from the current search must still find a home.
        let newcomer = base + 4 * buckets as u64;
        tt.store(newcomer, 1, None, 5, NodeType::Cut, 2, 0);
        assert!(tt.probe(newcomer, 0).is_some());
    }

    #[test]
    fn clear_empties_the_table() {
        let mut tt = TranspositionTable::new(1);
        tt.store(0x99, 3, None, 1, NodeType::Pv, 0, 0);
        assert!(tt.hashfull() <= 1000);
        tt.clear();
        assert_eq!(tt.populated(), 0);
        assert!(tt.probe(0x99, 0).is_none());
    }

    #[test]
    fn promotion_move_survives_roundtrip() {
        let mut tt = TranspositionTable::new(1);
        let promo = Move::new(Square::new(48), Square::new(56), Some(Piece::Queen));
        tt.store(0x5555, 2, Some(promo), 0, NodeType::Pv, 0, 0);
        assert_eq!(tt.probe(0x5555, 0).unwrap().best_move, Some(promo));
    }
}
