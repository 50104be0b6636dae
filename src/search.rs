use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arrayvec::ArrayVec;

use crate::board::{exchange_hint, see, Color, Move, MoveGen, Position, EMPTY};
use crate::evaluation::{self, MAX_POS_SCORE};
use crate::movepick::{mvv_lva, MovePicker};
use crate::params::SearchParameters;
use crate::pst::{KNIGHT_VALUE_EG, PAWN_VALUE_EG, PIECE_VALUE, QUEEN_VALUE_EG};
use crate::syzygy::SyzygyProber;
use crate::time::{SearchLimits, TimeAllocation};
use crate::tt::{NodeType, TranspositionTable};
use crate::types::{Score, SearchResult, DEFAULT_HASH_MB, INFTY, MATE_SCORE, MAX_PLY};

/// Margin a quiet move must close at low depth before it is worth playing
/// out. Indexed by remaining depth.
const FUTILITY_MARGIN: [Score; 4] = [
    0,
    MAX_POS_SCORE,
    MAX_POS_SCORE + KNIGHT_VALUE_EG,
    MAX_POS_SCORE + QUEEN_VALUE_EG,
];

/// Static-eval lead over beta that lets a frontier node fail high outright.
const REVERSE_FUTILITY_MARGIN: [Score; 3] = [0, MAX_POS_SCORE, MAX_POS_SCORE + 2 * PAWN_VALUE_EG];

/// Counters accumulated over one search and printed to stderr at the end.
#[derive(Default)]
pub struct SearchStatistics {
    pub nodes: u64,
    pub hash_probes: u64,
    pub hash_hits: u64,
    pub hash_score_cuts: u64,
    pub hash_move_attempts: u64,
    pub hash_move_cuts: u64,
    pub fail_highs: u64,
    pub first_fail_highs: u64,
    pub qs_nodes: u64,
    pub qs_fail_highs: u64,
    pub qs_first_fail_highs: u64,
}

impl SearchStatistics {
    pub fn reset(&mut self) {
        *self = SearchStatistics::default();
    }

    fn percent(numerator: u64, denominator: u64) -> f64 {
        if denominator == 0 {
            return 0.0;
        }
        (numerator * 10_000 / denominator) as f64 / 100.0
    }

    pub fn print(&self) {
        eprintln!(
            "hash hit rate: {}% of {} probes",
            Self::percent(self.hash_hits, self.hash_probes),
            self.hash_probes
        );
        eprintln!(
            "hash score cut rate: {}% of {} hits",
            Self::percent(self.hash_score_cuts, self.hash_hits),
            self.hash_hits
        );
        eprintln!(
            "hash move cut rate: {}% of {} hash moves",
            Self::percent(self.hash_move_cuts, self.hash_move_attempts),
            self.hash_move_attempts
        );
        eprintln!(
            "first fail high rate: {}% of {} fail highs",
            Self::percent(self.first_fail_highs, self.fail_highs),
            self.fail_highs
        );
        eprintln!(
            "qs nodes: {} ({}% of total)",
            self.qs_nodes,
            Self::percent(self.qs_nodes, self.nodes)
        );
        eprintln!(
            "qs first fail high rate: {}% of {} qs fail highs",
            Self::percent(self.qs_first_fail_highs, self.qs_fail_highs),
            self.qs_fail_highs
        );
    }
}

/// A principal variation, built bottom-up: each PV node prepends its best
/// move onto the line its child reported.
#[derive(Clone, Default)]
pub struct PrincipalVariation {
    line: ArrayVec<Move, { MAX_PLY + 1 }>,
}

impl PrincipalVariation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.line.clear();
    }

    pub fn load(&mut self, best: Move, child: &PrincipalVariation) {
        self.line.clear();
        self.line.push(best);
        for &mv in &child.line {
            if self.line.try_push(mv).is_err() {
                break;
            }
        }
    }

    pub fn moves(&self) -> &[Move] {
        &self.line
    }
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for mv in &self.line {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{mv}")?;
            first = false;
        }
        Ok(())
    }
}

/// Everything a search needs that outlives a single node: parameters,
/// statistics, the transposition table, the shared stop flag, and the hash
/// history of the game plus the current line (for repetition detection).
pub struct SearchState {
    pub params: SearchParameters,
    pub stats: SearchStatistics,
    pub tt: TranspositionTable,
    pub stop: Arc<AtomicBool>,
    pub syzygy: Option<SyzygyProber>,
    pub position_history: Vec<u64>,
    pub silent: bool,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            params: SearchParameters::new(),
            stats: SearchStatistics::default(),
            tt: TranspositionTable::new(DEFAULT_HASH_MB),
            stop: Arc::new(AtomicBool::new(false)),
            syzygy: None,
            position_history: Vec::new(),
            silent: false,
        }
    }

    /// Per-search reset: statistics and transient parameters. The table and
    /// the history heuristic persist across searches.
    pub fn reset(&mut self) {
        self.stats.reset();
        self.params.reset();
        self.stop.store(false, Ordering::SeqCst);
    }

    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    pub fn load_syzygy(&mut self, path: &str) {
        self.syzygy = SyzygyProber::new(path);
    }

    #[inline]
    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail-hard clamp of a fixed score into the caller's window.
#[inline]
fn clamp_window(score: Score, alpha: Score, beta: Score) -> Score {
    if score >= beta {
        beta
    } else if score > alpha {
        score
    } else {
        alpha
    }
}

/// Static evaluation from the side to move's point of view.
#[inline]
fn perspective(score: Score, side: Color) -> Score {
    match side {
        Color::White => score,
        Color::Black => -score,
    }
}

/// Format a score for UCI output: `mate N` within the mate band, `cp` scaled
/// to centipawns otherwise.
pub fn format_score(score: Score) -> String {
    if score >= MATE_SCORE - MAX_PLY as Score {
        // Our own mating line ends with our move: plies/2 + 1 full moves.
        format!("mate {}", (MATE_SCORE - score) / 2 + 1)
    } else if score <= -MATE_SCORE + MAX_PLY as Score {
        // Getting mated: the opponent's move ends it.
        format!("mate {}", (-MATE_SCORE - score) / 2)
    } else {
        format!("cp {}", score * 100 / PAWN_VALUE_EG)
    }
}

/// Iterative deepening driver. Searches the root to increasing depths,
/// feeding the best move of each iteration back to the front of the root
/// list, and reports one `info` line per completed depth.
pub fn search(position: &Position, state: &mut SearchState, limits: &SearchLimits) -> SearchResult {
    state.reset();
    let allocation = TimeAllocation::plan(limits, position.side_to_move());
    state.params.start_time = Instant::now();
    state.params.time_limit_ms = allocation.hard_ms;
    state.params.root_move_number = position.fullmove_number() as u8;

    let mut root_moves: Vec<Move> = MoveGen::new(position).collect();
    if root_moves.is_empty() {
        return SearchResult { best_move: None, score: 0, depth: 0, nodes: 0 };
    }
    // Safe default: any legal move beats forfeiting on time.
    let mut best_move = root_moves[0];
    let mut best_score: Score = -INFTY;

    let max_depth = match limits {
        SearchLimits::Depth(d) => (*d).clamp(1, MAX_PLY as u8),
        _ => MAX_PLY as u8,
    };

    state.position_history.push(position.zobrist());

    let mut completed_depth = 0u8;
    for root_depth in 1..=max_depth {
        state.params.reset();
        let mut pv = PrincipalVariation::new();

        let Some((best_index, score)) =
            root_search(position, state, &root_moves, root_depth as i32, &mut pv)
        else {
            break;
        };

        root_moves.swap(0, best_index);
        best_move = root_moves[0];
        best_score = score;
        completed_depth = root_depth;

        if !state.silent {
            let elapsed = state.params.elapsed_ms().max(1);
            let nps = state.stats.nodes * 1000 / elapsed;
            println!(
                "info depth {root_depth} score {} time {elapsed} nodes {} nps {nps} hashfull {} pv {pv}",
                format_score(score),
                state.stats.nodes,
                state.tt.hashfull(),
            );
        }

        if state.is_stopped() {
            break;
        }
        if allocation.soft_ms > 0 && state.params.elapsed_ms() > allocation.soft_ms {
            break;
        }
    }

    state.position_history.pop();
    // History aging between searches keeps old cutoffs from dominating the
    // next move's ordering.
    state.params.age_history_table();
    if !state.silent {
        state.stats.print();
    }

    SearchResult {
        best_move: Some(best_move),
        score: best_score,
        depth: completed_depth,
        nodes: state.stats.nodes,
    }
}

/// One root iteration. The first move in the list (last iteration's best) is
/// always searched with the full window so a valid best move exists; the
/// rest get the null-window treatment. Returns the index of the best move,
/// or `None` when stopped before any move was committed.
fn root_search(
    position: &Position,
    state: &mut SearchState,
    root_moves: &[Move],
    depth: i32,
    pv: &mut PrincipalVariation,
) -> Option<(usize, Score)> {
    let mut alpha = -MATE_SCORE;
    let beta = MATE_SCORE;
    let mut best_index: Option<usize> = None;
    let mut child_pv = PrincipalVariation::new();

    for (i, &mv) in root_moves.iter().enumerate() {
        if state.is_stopped() {
            return best_index.map(|idx| (idx, alpha));
        }

        let next = position.make_move(mv);
        state.stats.nodes += 1;
        child_pv.clear();

        let score = if i == 0 {
            search_child(position, &next, state, depth - 1, alpha, beta, &mut child_pv)
        } else {
            let null_score =
                search_child(position, &next, state, depth - 1, alpha, alpha + 1, &mut child_pv);
            if !state.is_stopped() && alpha < null_score && null_score < beta {
                search_child(position, &next, state, depth - 1, alpha, beta, &mut child_pv)
            } else {
                null_score
            }
        };

        if state.is_stopped() {
            return best_index.map(|idx| (idx, alpha));
        }

        if score > alpha {
            alpha = score;
            best_index = Some(i);
            pv.load(mv, &child_pv);
        }
    }

    best_index.map(|idx| (idx, alpha))
}

/// Recurse into a child position with the window `[-beta, -alpha]`, keeping
/// the ply counter and the repetition history balanced around the call.
fn search_child(
    position: &Position,
    next: &Position,
    state: &mut SearchState,
    depth: i32,
    alpha: Score,
    beta: Score,
    pv: &mut PrincipalVariation,
) -> Score {
    state.position_history.push(position.zobrist());
    state.params.ply += 1;
    let score = -pvs(next, state, depth, -beta, -alpha, pv);
    state.params.ply -= 1;
    state.position_history.pop();
    score
}

fn is_draw(state: &SearchState, position: &Position) -> bool {
    position.halfmove_clock() >= 100
        || position.has_insufficient_material()
        || state.position_history.contains(&position.zobrist())
}

enum Probe {
    Cutoff(Score),
    Hash(Option<Move>),
}

/// Transposition probe. An all-node entry deep enough can bound us to alpha;
/// a cut-node entry deep enough can bound us to beta. An exact (PV) entry
/// deliberately produces no cutoff, only a hash move, which keeps printed
/// variations whole. A surviving hash move is validated against the board
/// and searched immediately, before move generation is paid for.
fn probe_tt(
    position: &Position,
    state: &mut SearchState,
    depth: i32,
    alpha: &mut Score,
    beta: Score,
    pv: &mut PrincipalVariation,
) -> Probe {
    state.stats.hash_probes += 1;
    let entry = match state.tt.probe(position.zobrist(), state.params.ply) {
        Some(e) => e,
        None => return Probe::Hash(None),
    };
    state.stats.hash_hits += 1;
    let hash_score = entry.score as Score;

    if entry.node_type == NodeType::All {
        if entry.depth as i32 >= depth && hash_score <= *alpha {
            state.stats.hash_score_cuts += 1;
            return Probe::Cutoff(*alpha);
        }
        // All-nodes carry no move.
        return Probe::Hash(None);
    }

    let hash_move = match entry.best_move {
        Some(m) => m,
        None => return Probe::Hash(None),
    };

    if entry.depth as i32 >= depth && entry.node_type == NodeType::Cut && hash_score >= beta {
        state.stats.hash_score_cuts += 1;
        state.stats.fail_highs += 1;
        state.stats.first_fail_highs += 1;
        return Probe::Cutoff(beta);
    }

    if !position.is_legal(hash_move) {
        // A colliding key wrote this slot; the move belongs to some other
        // position. Drop it and search normally.
        eprintln!("hash collision: discarding table move {hash_move}");
        return Probe::Hash(None);
    }

    state.stats.hash_move_attempts += 1;
    state.stats.nodes += 1;
    let next = position.make_move(hash_move);
    let mut line = PrincipalVariation::new();
    let score = search_child(position, &next, state, depth - 1, *alpha, beta, &mut line);
    if state.is_stopped() {
        return Probe::Cutoff(-INFTY);
    }
    if score >= beta {
        state.stats.hash_move_cuts += 1;
        return Probe::Cutoff(beta);
    }
    if score > *alpha {
        *alpha = score;
        pv.load(hash_move, &line);
    }
    Probe::Hash(Some(hash_move))
}

/// Principal-variation search, fail-hard: the return value always lies in
/// `[alpha, beta]`. `-INFTY` is the one exception, the abort sentinel on the
/// way out of a stopped search.
pub fn pvs(
    position: &Position,
    state: &mut SearchState,
    depth: i32,
    mut alpha: Score,
    beta: Score,
    pv: &mut PrincipalVariation,
) -> Score {
    if depth <= 0 {
        pv.clear();
        return quiescence(position, state, 0, alpha, beta);
    }

    if is_draw(state, position) {
        return clamp_window(0, alpha, beta);
    }

    let prev_alpha = alpha;
    let color = position.side_to_move();

    let hash_move = match probe_tt(position, state, depth, &mut alpha, beta, pv) {
        Probe::Cutoff(score) => return score,
        Probe::Hash(hm) => hm,
    };

    if state.params.ply > 0 {
        if let Some(ref syzygy) = state.syzygy {
            if let Some(wdl) = syzygy.probe_wdl(position) {
                return clamp_window(wdl, alpha, beta);
            }
        }
    }

    // A null window means some ancestor is just testing a bound; real PV
    // nodes get none of the speculative pruning below.
    let is_pv_node = beta - alpha != 1;
    let in_check = position.in_check();
    let static_eval = perspective(evaluation::evaluate(position), color);

    let mut line = PrincipalVariation::new();

    // Null move pruning: hand the opponent a free tempo, and if a reduced
    // search still clears beta, the real position almost certainly does too.
    // Skipped with only king and pawns (zugzwang) and capped at two null
    // moves per path.
    if depth >= 3
        && !is_pv_node
        && !in_check
        && state.params.null_move_count < 2
        && static_eval >= beta
        && position.non_pawn_material(color) > 0
    {
        if let Some(null_position) = position.make_null_move() {
            let base = if depth >= 11 {
                4
            } else if depth >= 6 {
                3
            } else {
                2
            };
            // Reduce more the further ahead we are, but never drop the
            // child straight into quiescence.
            let reduction = (base + (static_eval - beta) / PAWN_VALUE_EG).min(depth - 2);

            state.params.null_move_count += 1;
            let null_score = search_child(
                position,
                &null_position,
                state,
                depth - 1 - reduction,
                alpha,
                beta,
                &mut line,
            );
            state.params.null_move_count -= 1;

            if state.is_stopped() {
                return -INFTY;
            }
            if null_score >= beta {
                return beta;
            }
        }
    }

    // Reverse futility: at the last couple of plies, a static eval far
    // enough above beta fails high without searching anything.
    if !is_pv_node
        && !in_check
        && depth <= 2
        && static_eval - REVERSE_FUTILITY_MARGIN[depth as usize] >= beta
        && position.non_pawn_material(color) > 0
    {
        return beta;
    }

    let mut picker = MovePicker::new(position, &state.params, hash_move, is_pv_node, in_check);

    let mut best_move: Option<Move> = None;
    let mut moves_searched: u32 = if hash_move.is_some() { 1 } else { 0 };
    let mut tried_any = hash_move.is_some();
    let mut score: Score;

    while let Some(mv) = picker.next() {
        if state.params.out_of_time() {
            state.stop.store(true, Ordering::Relaxed);
        }
        if state.is_stopped() {
            return -INFTY;
        }

        // Futility: well below alpha at frontier depths, a quiet move that
        // doesn't check is not going to climb back in quiescence.
        if depth <= 3
            && static_eval <= alpha - FUTILITY_MARGIN[depth as usize]
            && picker.node_is_reducible()
            && !position.is_capture(mv)
            && alpha.abs() < QUEEN_VALUE_EG
            && !mv.is_promotion()
            && !position.gives_check(mv)
        {
            tried_any = true;
            continue;
        }

        let next = position.make_move(mv);
        state.stats.nodes += 1;
        line.clear();

        // Late move reduction: at a node where nothing has raised alpha,
        // late quiet moves get a shallower look first.
        let mut reduction = 0;
        if picker.node_is_reducible()
            && !position.is_capture(mv)
            && depth >= 3
            && moves_searched > 2
            && alpha == prev_alpha
            && !state.params.is_killer(mv)
            && !mv.is_promotion()
            && !next.in_check()
        {
            reduction = (((depth as f64 - 3.0) / 4.0 + moves_searched as f64 / 9.5) as i32)
                .clamp(0, depth - 2);
        }

        if moves_searched == 0 {
            score = search_child(position, &next, state, depth - 1, alpha, beta, &mut line);
        } else {
            score = search_child(
                position,
                &next,
                state,
                depth - 1 - reduction,
                alpha,
                alpha + 1,
                &mut line,
            );
            // Re-search at full depth and window when the bound probe
            // suggests this move is better than the null window admits.
            if !state.is_stopped() && alpha < score && score < beta {
                score = search_child(position, &next, state, depth - 1, alpha, beta, &mut line);
            }
        }

        if state.is_stopped() {
            return -INFTY;
        }
        tried_any = true;

        if score >= beta {
            state.stats.fail_highs += 1;
            if moves_searched == 0 {
                state.stats.first_fail_highs += 1;
            }
            state.tt.store(
                position.zobrist(),
                depth as u8,
                Some(mv),
                beta,
                NodeType::Cut,
                state.params.root_move_number,
                state.params.ply,
            );
            if !position.is_capture(mv) {
                state.params.record_killer(mv);
                if let (Some(piece), Some(c)) =
                    (position.piece_on(mv.from()), position.color_on(mv.from()))
                {
                    state.params.reward_history(c, piece, mv.to(), depth);
                }
                picker.reduce_bad_histories(position, &mut state.params, depth, mv);
            }
            return beta;
        }

        if score > alpha {
            alpha = score;
            best_move = Some(mv);
            pv.load(mv, &line);
        }

        moves_searched += 1;
    }

    // Nothing to try at all: mate or stalemate.
    if !tried_any {
        return score_mate(in_check, state.params.ply, alpha, beta);
    }

    if let Some(best) = best_move {
        if prev_alpha < alpha && alpha < beta {
            // Exact score on the principal variation.
            state.tt.store(
                position.zobrist(),
                depth as u8,
                Some(best),
                alpha,
                NodeType::Pv,
                state.params.root_move_number,
                state.params.ply,
            );
            if !position.is_capture(best) {
                if let (Some(piece), Some(c)) =
                    (position.piece_on(best.from()), position.color_on(best.from()))
                {
                    state.params.reward_history(c, piece, best.to(), depth);
                }
                picker.reduce_bad_histories(position, &mut state.params, depth, best);
            }
        }
    } else if alpha <= prev_alpha {
        // All-node: the upper bound alone is worth remembering; fail-hard
        // search has no best move to attach.
        state.tt.store(
            position.zobrist(),
            depth as u8,
            None,
            alpha,
            NodeType::All,
            state.params.root_move_number,
            state.params.ply,
        );
    }

    alpha
}

/// Score a node with no legal moves: checkmate (closer mates score worse for
/// the mated side) or stalemate, clamped into the window.
fn score_mate(in_check: bool, ply: usize, alpha: Score, beta: Score) -> Score {
    let score = if in_check { -MATE_SCORE + ply as Score } else { 0 };
    clamp_window(score, alpha, beta)
}

/// Pick the highest-scored remaining move, swapping it into place: a partial
/// selection sort, so an early cutoff never ranks the tail.
fn pick_next(list: &mut ArrayVec<(Move, Score), 128>, index: usize) -> Option<Move> {
    if index >= list.len() {
        return None;
    }
    let mut best = index;
    for i in index + 1..list.len() {
        if list[i].1 > list[best].1 {
            best = i;
        }
    }
    list.swap(index, best);
    Some(list[index].0)
}

/// Quiescence search: resolve captures, promotions and (at the first ply)
/// checks until the position is quiet enough for a static score. Fail-hard
/// like the main search.
pub fn quiescence(
    position: &Position,
    state: &mut SearchState,
    plies: i32,
    mut alpha: Score,
    beta: Score,
) -> Score {
    let color = position.side_to_move();
    if position.in_check() {
        return check_quiescence(position, state, plies, alpha, beta);
    }

    // Staged stand pat: the material count alone settles most nodes; the
    // positional term is only added when the node is close.
    let mut stand_pat = perspective(evaluation::material(position), color);
    if stand_pat >= beta + MAX_POS_SCORE {
        return beta;
    }
    if stand_pat < alpha - 2 * MAX_POS_SCORE - QUEEN_VALUE_EG {
        return alpha;
    }

    stand_pat += perspective(evaluation::positional(position), color);
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }
    if stand_pat < alpha - MAX_POS_SCORE - QUEEN_VALUE_EG {
        return alpha;
    }

    let mut captures: ArrayVec<(Move, Score), 128> = ArrayVec::new();
    let mut promotions: ArrayVec<Move, 32> = ArrayVec::new();
    let mut quiets: ArrayVec<Move, 128> = ArrayVec::new();
    for mv in MoveGen::new(position) {
        if position.is_capture(mv) {
            let _ = captures.try_push((mv, mvv_lva(position, mv)));
        } else if mv.is_promotion() {
            let _ = promotions.try_push(mv);
        } else if plies <= 0 {
            let _ = quiets.try_push(mv);
        }
    }

    let mut fail_high_candidates = 0u64;
    let mut index = 0;
    while let Some(mv) = pick_next(&mut captures, index) {
        index += 1;

        // Delta pruning: even winning this piece cleanly cannot lift the
        // score back to alpha.
        let victim_value = if position.is_en_passant(mv) {
            PIECE_VALUE[0].eg as Score
        } else {
            position.piece_on(mv.to()).map_or(0, |p| PIECE_VALUE[p.index()].eg as Score)
        };
        if stand_pat + victim_value < alpha - MAX_POS_SCORE {
            continue;
        }
        // A clearly losing exchange is not going to save the node either.
        if exchange_hint(position, mv) < 0 && see(position, mv) < -MAX_POS_SCORE {
            continue;
        }

        let next = position.make_move(mv);
        state.stats.nodes += 1;
        state.stats.qs_nodes += 1;
        let score = -quiescence(&next, state, plies + 1, -beta, -alpha);

        if score >= beta {
            state.stats.qs_fail_highs += 1;
            if fail_high_candidates == 0 {
                state.stats.qs_first_fail_highs += 1;
            }
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
        fail_high_candidates += 1;
    }

    for &mv in &promotions {
        // A promotion the opponent wins on the spot is not worth extending.
        if see(position, mv) < 0 {
            continue;
        }

        let next = position.make_move(mv);
        state.stats.nodes += 1;
        state.stats.qs_nodes += 1;
        let score = -quiescence(&next, state, plies + 1, -beta, -alpha);

        if score >= beta {
            state.stats.qs_fail_highs += 1;
            if fail_high_candidates == 0 {
                state.stats.qs_first_fail_highs += 1;
            }
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
        fail_high_candidates += 1;
    }

    // Checking moves, first quiescence ply only: deep check chains explode
    // and rarely change the verdict.
    if plies <= 0 {
        for &mv in &quiets {
            if !position.gives_check(mv) {
                continue;
            }

            let next = position.make_move(mv);
            state.stats.nodes += 1;
            state.stats.qs_nodes += 1;
            let score = -check_quiescence(&next, state, plies + 1, -beta, -alpha);

            if score >= beta {
                state.stats.qs_fail_highs += 1;
                if fail_high_candidates == 0 {
                    state.stats.qs_first_fail_highs += 1;
                }
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
            fail_high_candidates += 1;
        }
    }

    alpha
}

/// Quiescence while in check: every evasion must be considered, standing pat
/// is not an option, and no evasions at all means mate right here.
fn check_quiescence(
    position: &Position,
    state: &mut SearchState,
    plies: i32,
    mut alpha: Score,
    beta: Score,
) -> Score {
    let mut evasions = MoveGen::new(position);
    if evasions.is_empty() {
        let mate = -MATE_SCORE + state.params.ply as Score + plies;
        return clamp_window(mate, alpha, beta);
    }

    let mut searched = 0u64;
    // Captures of the checker first, then everything else.
    evasions.set_mask(position.by_color(!position.side_to_move()));
    let mut ordered: Vec<Move> = evasions.by_ref().collect();
    evasions.set_mask(!EMPTY);
    ordered.extend(evasions);

    for mv in ordered {
        let next = position.make_move(mv);
        state.stats.nodes += 1;
        state.stats.qs_nodes += 1;
        let score = -quiescence(&next, state, plies + 1, -beta, -alpha);

        if score >= beta {
            state.stats.qs_fail_highs += 1;
            if searched == 0 {
                state.stats.qs_first_fail_highs += 1;
            }
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
        searched += 1;
    }

    alpha
}
