use std::path::Path;

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess};
use shakmaty_syzygy::{Tablebase, Wdl};

use crate::board::Position;
use crate::pst::PAWN_VALUE_EG;
use crate::types::{Score, MATE_SCORE, MAX_PLY};

/// Largest number of men the loaded WDL sets cover.
pub const MAX_MEN: u32 = 5;

/// Score for a tablebase-won position: decisive enough to dominate any
/// static evaluation, but below the mate band so the search can still
/// sharpen a table win into a concrete mate distance.
pub const TB_WIN: Score = 125 * PAWN_VALUE_EG;
const _: () = assert!(TB_WIN < MATE_SCORE - MAX_PLY as Score);

/// Is the position small enough to exist in the tables at all? Checked
/// before any conversion work is spent.
#[inline]
pub fn probeable(position: &Position) -> bool {
    position.occupied().popcnt() <= MAX_MEN
}

/// Win/draw/loss probing against Syzygy tables, loaded only when the UCI
/// `SyzygyPath` option points at a real directory.
pub struct SyzygyProber {
    tablebase: Tablebase<Chess>,
}

impl SyzygyProber {
    pub fn new(path: &str) -> Option<Self> {
        if !Path::new(path).is_dir() {
            return None;
        }
        let mut tablebase = Tablebase::new();
        tablebase.add_directory(path).ok()?;
        Some(Self { tablebase })
    }

    /// Verdict for the side to move, or `None` when the position is too
    /// big, the needed table is absent, or the conversion fails; any miss
    /// just means the search carries on normally. Conversion runs through
    /// FEN, whose cost at `MAX_MEN` pieces is noise next to the probe.
    pub fn probe_wdl(&self, position: &Position) -> Option<Score> {
        if !probeable(position) {
            return None;
        }
        let chess: Chess = position
            .to_string()
            .parse::<Fen>()
            .ok()?
            .into_position(CastlingMode::Standard)
            .ok()?;
        let wdl = self.tablebase.probe_wdl_after_zeroing(&chess).ok()?;
        Some(verdict_score(wdl))
    }
}

/// Cursed wins and blessed losses are draws under the fifty-move rule, so
/// they score as draws; only the genuine verdicts get the decisive bound.
fn verdict_score(wdl: Wdl) -> Score {
    match wdl {
        Wdl::Win => TB_WIN,
        Wdl::Loss => -TB_WIN,
        Wdl::Draw | Wdl::CursedWin | Wdl::BlessedLoss => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn missing_path_yields_no_prober() {
        assert!(SyzygyProber::new("/nonexistent/tables").is_none());
    }

    #[test]
    fn probe_limit_counts_men() {
        // 32 men, far past the limit.
        assert!(!probeable(&Position::default()));

        // Three men, comfortably inside.
        let kqk = Position::from_str("4k3/Q7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(probeable(&kqk));

        // Exactly at the limit: five men probe.
        let five = Position::from_str("4k3/QQ6/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert_eq!(five.occupied().popcnt(), 5);
        assert!(probeable(&five));

        // One over: six men never probe.
        let six = Position::from_str("4k3/QQQQ4/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(six.occupied().popcnt(), 6);
        assert!(!probeable(&six));
    }

    #[test]
    fn verdicts_are_symmetric_and_below_the_mate_band() {
        assert_eq!(verdict_score(Wdl::Draw), 0);
        assert_eq!(verdict_score(Wdl::CursedWin), 0);
        assert_eq!(verdict_score(Wdl::BlessedLoss), 0);
        assert_eq!(verdict_score(Wdl::Win), -verdict_score(Wdl::Loss));
        assert!(verdict_score(Wdl::Win) > 0);
        assert!(verdict_score(Wdl::Win) < MATE_SCORE - MAX_PLY as Score);
    }
}
