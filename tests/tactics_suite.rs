use std::str::FromStr;

use lodestone::board::Position;
use lodestone::search::{search, SearchState};
use lodestone::time::SearchLimits;

/// A handful of forced tactics, one per line: `<FEN> bm <move(s)>; id "<name>";`
/// with best moves in coordinate notation.
const SUITE: &str = r#"
r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - bm h5f7; id "scholars-mate";
rnb1kbnr/pppp1ppp/8/3q4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - bm e4d5; id "hanging-queen";
6k1/5ppp/8/8/8/8/8/R3K3 w - - bm a1a8; id "back-rank";
k7/p7/1K6/8/8/8/8/7R w - - bm h1h8; id "corner-mate";
4k3/8/8/3p4/8/8/8/3RK3 w - - bm d1d5; id "free-pawn";
"#;

/// Parse one EPD line into (fen, best moves, id).
fn parse_epd_line(line: &str) -> Option<(String, Vec<String>, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let bm_idx = line.find(" bm ")?;
    let fen = line[..bm_idx].to_string();
    let rest = &line[bm_idx + 4..];

    let semi_idx = rest.find(';')?;
    let best_moves: Vec<String> =
        rest[..semi_idx].split_whitespace().map(|s| s.to_string()).collect();

    let id = rest
        .find("id \"")
        .and_then(|start| {
            let content = &rest[start + 4..];
            content.find('"').map(|end| content[..end].to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    Some((fen, best_moves, id))
}

#[test]
fn epd_parser_extracts_fields() {
    let line = r#"6k1/5ppp/8/8/8/8/8/R3K3 w - - bm a1a8; id "back-rank";"#;
    let (fen, moves, id) = parse_epd_line(line).unwrap();
    assert_eq!(fen, "6k1/5ppp/8/8/8/8/8/R3K3 w - -");
    assert_eq!(moves, vec!["a1a8"]);
    assert_eq!(id, "back-rank");
}

#[test]
fn solves_the_tactics_suite() {
    lodestone::board::init();

    let mut total = 0;
    for line in SUITE.lines() {
        let Some((fen, best_moves, id)) = parse_epd_line(line) else {
            continue;
        };
        total += 1;

        let position = Position::from_str(&fen).unwrap_or_else(|e| panic!("{id}: bad FEN: {e}"));
        let mut state = SearchState::new();
        state.silent = true;
        let result = search(&position, &mut state, &SearchLimits::Depth(4));

        let found = result.best_move.unwrap_or_else(|| panic!("{id}: no move returned"));
        assert!(
            best_moves.contains(&found.to_string()),
            "{id}: played {found}, expected one of {best_moves:?}"
        );
    }

    assert_eq!(total, 5, "suite should hold 5 positions");
}
