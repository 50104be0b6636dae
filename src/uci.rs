use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::board::{File, Move, Piece, Position, Rank, Square};
use crate::errors::MoveParseError;
use crate::search::{self, SearchState};
use crate::time::SearchLimits;
use crate::types::{EngineConfig, DEFAULT_DEPTH};

pub fn run() {
    let stdin = io::stdin();

    let mut position = Position::default();
    let mut config = EngineConfig::default();
    let mut search_state: Option<SearchState> = Some(SearchState::new());
    let mut stop_flag: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    let mut search_thread: Option<thread::JoinHandle<SearchState>> = None;
    let mut position_history: Vec<u64> = Vec::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        match tokens[0] {
            "uci" => {
                println!("id name Lodestone {}", env!("CARGO_PKG_VERSION"));
                println!("id author the Lodestone developers");
                println!("option name Hash type spin default 64 min 1 max 4096");
                println!("option name SyzygyPath type string default <empty>");
                println!("uciok");
            }
            "isready" => {
                wait_for_search(&mut search_thread, &mut search_state);
                println!("readyok");
            }
            "ucinewgame" => {
                wait_for_search(&mut search_thread, &mut search_state);
                position = Position::default();
                position_history.clear();
                if let Some(ref mut state) = search_state {
                    state.tt.clear();
                    state.params.clear_history_table();
                }
            }
            "position" => {
                wait_for_search(&mut search_thread, &mut search_state);
                parse_position(&tokens, &mut position, &mut position_history);
            }
            "go" => {
                wait_for_search(&mut search_thread, &mut search_state);

                let limits = parse_go(&tokens);
                let mut state = match search_state.take() {
                    Some(s) => s,
                    None => SearchState::new(),
                };
                state.position_history = position_history.clone();

                let flag = Arc::new(AtomicBool::new(false));
                stop_flag = flag.clone();
                state.stop = flag;

                let root = position;
                search_thread = Some(thread::spawn(move || {
                    let result = search::search(&root, &mut state, &limits);
                    match result.best_move {
                        Some(mv) => println!("bestmove {mv}"),
                        None => println!("bestmove 0000"),
                    }
                    state
                }));
            }
            "stop" => {
                stop_flag.store(true, Ordering::SeqCst);
                wait_for_search(&mut search_thread, &mut search_state);
            }
            "setoption" => {
                wait_for_search(&mut search_thread, &mut search_state);
                if let Some(ref mut state) = search_state {
                    parse_setoption(&tokens, &mut config, state);
                }
            }
            "d" | "print" => {
                println!("{position}");
            }
            "quit" => {
                stop_flag.store(true, Ordering::SeqCst);
                wait_for_search(&mut search_thread, &mut search_state);
                break;
            }
            _ => {}
        }
    }
}

/// Join a running search thread and recover its state for the next command.
fn wait_for_search(
    handle: &mut Option<thread::JoinHandle<SearchState>>,
    state: &mut Option<SearchState>,
) {
    if let Some(h) = handle.take() {
        match h.join() {
            Ok(s) => *state = Some(s),
            // A panicked search loses its tables; start fresh.
            Err(_) => *state = Some(SearchState::new()),
        }
    }
}

fn parse_go(tokens: &[&str]) -> SearchLimits {
    let mut depth: Option<u8> = None;
    let mut movetime: Option<u64> = None;
    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: Option<u64> = None;
    let mut binc: Option<u64> = None;
    let mut movestogo: Option<u64> = None;
    let mut infinite = false;

    let mut i = 1;
    while i < tokens.len() {
        let value = tokens.get(i + 1).and_then(|t| t.parse().ok());
        match tokens[i] {
            "depth" => {
                depth = tokens.get(i + 1).and_then(|t| t.parse().ok());
                i += 1;
            }
            "movetime" => {
                movetime = value;
                i += 1;
            }
            "wtime" => {
                wtime = value;
                i += 1;
            }
            "btime" => {
                btime = value;
                i += 1;
            }
            "winc" => {
                winc = value;
                i += 1;
            }
            "binc" => {
                binc = value;
                i += 1;
            }
            "movestogo" => {
                movestogo = value;
                i += 1;
            }
            "infinite" => infinite = true,
            _ => {}
        }
        i += 1;
    }

    if infinite {
        SearchLimits::Infinite
    } else if let Some(ms) = movetime {
        SearchLimits::MoveTime(ms)
    } else if wtime.is_some() || btime.is_some() {
        SearchLimits::Clock {
            wtime: wtime.unwrap_or(0),
            btime: btime.unwrap_or(0),
            winc: winc.unwrap_or(0),
            binc: binc.unwrap_or(0),
            movestogo,
        }
    } else {
        SearchLimits::Depth(depth.unwrap_or(DEFAULT_DEPTH))
    }
}

fn parse_position(tokens: &[&str], position: &mut Position, history: &mut Vec<u64>) {
    if tokens.len() < 2 {
        return;
    }

    let mut idx = 1;
    if tokens[idx] == "startpos" {
        *position = Position::default();
        idx += 1;
    } else if tokens[idx] == "fen" {
        idx += 1;
        let mut fen_parts: Vec<&str> = Vec::new();
        while idx < tokens.len() && tokens[idx] != "moves" && fen_parts.len() < 6 {
            fen_parts.push(tokens[idx]);
            idx += 1;
        }
        if fen_parts.len() < 4 {
            return;
        }
        match Position::from_str(&fen_parts.join(" ")) {
            Ok(p) => *position = p,
            Err(err) => {
                eprintln!("bad fen: {err}");
                return;
            }
        }
    } else {
        return;
    }

    // Hash history for repetition detection, including the current position.
    history.clear();
    history.push(position.zobrist());

    if idx < tokens.len() && tokens[idx] == "moves" {
        idx += 1;
        for &move_str in &tokens[idx..] {
            match parse_uci_move(position, move_str) {
                Ok(mv) => {
                    *position = position.make_move(mv);
                    history.push(position.zobrist());
                }
                Err(err) => {
                    eprintln!("bad move in position command: {err}");
                    return;
                }
            }
        }
    }
}

/// Parse a move in UCI coordinate notation directly into squares plus an
/// optional promotion piece, then validate it against the legal move list.
fn parse_uci_move(position: &Position, move_str: &str) -> Result<Move, MoveParseError> {
    let bytes = move_str.as_bytes();
    if bytes.len() < 4 {
        return Err(MoveParseError::TooShort(move_str.to_string()));
    }

    let from_file = bytes[0].wrapping_sub(b'a');
    let from_rank = bytes[1].wrapping_sub(b'1');
    let to_file = bytes[2].wrapping_sub(b'a');
    let to_rank = bytes[3].wrapping_sub(b'1');

    if from_file >= 8 || from_rank >= 8 || to_file >= 8 || to_rank >= 8 {
        return Err(MoveParseError::BadSquare(move_str.to_string()));
    }

    let from = Square::make(Rank::from_index(from_rank as usize), File::from_index(from_file as usize));
    let to = Square::make(Rank::from_index(to_rank as usize), File::from_index(to_file as usize));

    let promotion = if bytes.len() >= 5 {
        match bytes[4] {
            b'q' => Some(Piece::Queen),
            b'r' => Some(Piece::Rook),
            b'b' => Some(Piece::Bishop),
            b'n' => Some(Piece::Knight),
            _ => None,
        }
    } else {
        None
    };

    let mv = Move::new(from, to, promotion);
    if position.is_legal(mv) {
        Ok(mv)
    } else {
        Err(MoveParseError::Illegal(move_str.to_string()))
    }
}

fn parse_setoption(tokens: &[&str], config: &mut EngineConfig, state: &mut SearchState) {
    let name_idx = tokens.iter().position(|&t| t == "name");
    let value_idx = tokens.iter().position(|&t| t == "value");

    let (Some(ni), Some(vi)) = (name_idx, value_idx) else {
        return;
    };
    let name: String = tokens[ni + 1..vi].join(" ");
    let value: String = tokens[vi + 1..].join(" ");

    match name.to_lowercase().as_str() {
        "hash" => {
            if let Ok(mb) = value.parse::<usize>() {
                config.hash_mb = mb.clamp(1, 4096);
                state.resize_tt(config.hash_mb);
            }
        }
        "syzygypath" => {
            if value.is_empty() || value == "<empty>" {
                config.syzygy_path = None;
                state.syzygy = None;
            } else {
                config.syzygy_path = Some(value.clone());
                state.load_syzygy(&value);
            }
        }
        _ => {}
    }
}
