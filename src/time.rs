use crate::board::Color;

/// What the `go` command asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchLimits {
    /// Search to a fixed depth, no clock.
    Depth(u8),
    /// Spend (up to) a fixed number of milliseconds on this move.
    MoveTime(u64),
    /// Game clock: remaining time and increments per side, optionally the
    /// number of moves to the next control.
    Clock {
        wtime: u64,
        btime: u64,
        winc: u64,
        binc: u64,
        movestogo: Option<u64>,
    },
    /// Search until told to stop.
    Infinite,
}

/// Fraction of the budget after which no new iteration is started.
pub const TIME_FACTOR_NUM: u64 = 2;
pub const TIME_FACTOR_DEN: u64 = 5;
/// Headroom multiplier for finishing the current iteration.
pub const MAX_TIME_FACTOR: u64 = 2;

/// Soft/hard split of the time budget. The soft bound gates new iterations
/// of the deepening loop; the hard bound aborts the search mid-iteration.
/// Zero means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeAllocation {
    pub soft_ms: u64,
    pub hard_ms: u64,
}

impl TimeAllocation {
    pub const UNBOUNDED: TimeAllocation = TimeAllocation { soft_ms: 0, hard_ms: 0 };

    pub fn plan(limits: &SearchLimits, side: Color) -> TimeAllocation {
        match *limits {
            SearchLimits::Depth(_) | SearchLimits::Infinite => TimeAllocation::UNBOUNDED,
            // `movetime` is a contract, not a budget: the hard bound is the
            // requested time itself.
            SearchLimits::MoveTime(ms) => TimeAllocation {
                soft_ms: ms * TIME_FACTOR_NUM / TIME_FACTOR_DEN,
                hard_ms: ms,
            },
            SearchLimits::Clock { wtime, btime, winc, binc, movestogo } => {
                let (remaining, inc) = match side {
                    Color::White => (wtime, winc),
                    Color::Black => (btime, binc),
                };
                if remaining == 0 {
                    return TimeAllocation::UNBOUNDED;
                }
                let moves_left = movestogo.unwrap_or(40).max(1);
                let budget = (remaining / moves_left + inc * 3 / 4).min(remaining * 4 / 5);
                TimeAllocation {
                    soft_ms: budget * TIME_FACTOR_NUM / TIME_FACTOR_DEN,
                    hard_ms: (budget * MAX_TIME_FACTOR).min(remaining * 4 / 5),
                }
            }
        }
    }
}
