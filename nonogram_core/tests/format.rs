//! Round trips across the textual grammar and the cache codec.

use nonogram_core::cache::{self, Decoder, Encoder};
use nonogram_core::format;
use nonogram_core::{Grid, Puzzle, Rule};

const CROSSHAIR: &str = "\
# a 3x3 crosshair
title \"crosshair\"
width 3
height 3

rows
1
3
1

columns
1
3
1
";

#[test]
fn text_to_cache_and_back() {
    let puzzle = format::parse(CROSSHAIR).unwrap();
    let encoded = cache::encode_puzzle(&puzzle).unwrap();
    let decoded = cache::decode_puzzle(&encoded, puzzle.width(), puzzle.height()).unwrap();

    // Notes do not travel through the cache; the rules must be identical.
    assert_eq!(decoded.rows(), puzzle.rows());
    assert_eq!(decoded.cols(), puzzle.cols());
    assert_eq!(decoded.compare(&puzzle), std::cmp::Ordering::Equal);
    assert_ne!(decoded, puzzle);
}

#[test]
fn printed_text_parses_back() {
    let puzzle = format::parse(CROSSHAIR).unwrap();
    let text = puzzle.to_string();
    assert_eq!(format::parse(&text).unwrap(), puzzle);
}

#[test]
fn three_by_three_round_trip() {
    // 3x3 with rows [1],[2],[1] and columns [2],[1],[1].
    let puzzle = Puzzle::new(
        vec![
            Rule::from(vec![1]),
            Rule::from(vec![2]),
            Rule::from(vec![1]),
        ],
        vec![
            Rule::from(vec![2]),
            Rule::from(vec![1]),
            Rule::from(vec![1]),
        ],
    );
    let encoded = cache::encode_puzzle(&puzzle).unwrap();
    let back = cache::decode_puzzle(&encoded, 3, 3).unwrap();
    assert_eq!(back.rows(), puzzle.rows());
    assert_eq!(back.cols(), puzzle.cols());
}

#[test]
fn grid_and_puzzle_share_a_stream() {
    let grid = Grid::parse("-#-\n###\n-#-\n", 3, 3, '#', '-');
    let puzzle = Puzzle::from_grid(&grid).unwrap();

    let mut enc = Encoder::new();
    enc.put_puzzle(&puzzle).unwrap();
    enc.put_cells(&grid).unwrap();
    let stream = enc.into_string();

    let mut dec = Decoder::new(&stream);
    let puzzle_back = dec.take_puzzle(3, 3).unwrap();
    let grid_back = dec.take_cells(3, 3).unwrap();
    assert_eq!(dec.remaining(), 0);
    assert!(puzzle_back.check_grid(&grid_back));
    assert_eq!(grid_back, grid);
}

#[test]
fn derived_puzzle_balances() {
    let grid = Grid::parse("##-\n-##\n#--\n", 3, 3, '#', '-');
    let puzzle = Puzzle::from_grid(&grid).unwrap();
    assert_eq!(puzzle.verify(), 0);
    assert!(puzzle.check_grid(&grid));
    assert!(puzzle.judge().is_finite());
}
