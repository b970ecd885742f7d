use ragsearch_core::chunker::{sliding_window_chunk, Chunker};
use ragsearch_core::config::ChunkingConfig;
use ragsearch_core::Error;

fn tokens(n: usize) -> String {
    (0..n).map(|i| format!("t{i}")).collect::<Vec<_>>().join(" ")
}

fn expected_count(len: usize, window: usize, overlap: usize) -> usize {
    if len == 0 { return 0; }
    let numer = len.saturating_sub(overlap).max(1);
    numer.div_ceil(window - overlap)
}

/// Drop each chunk's leading overlap (except the first) and glue the rest back together.
fn reconstruct(chunks: &[String], overlap: usize) -> Vec<String> {
    let mut out = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let skip = if i == 0 { 0 } else { overlap };
        out.extend(chunk.split(' ').skip(skip).map(str::to_string));
    }
    out
}

#[test]
fn literal_seven_tokens_window_four_overlap_one() {
    let chunks = sliding_window_chunk("a b c d e f g", 4, 1).unwrap();
    assert_eq!(chunks, ["a b c d", "d e f g"]);
    assert_eq!(reconstruct(&chunks, 1), ["a", "b", "c", "d", "e", "f", "g"]);
}

#[test]
fn chunk_count_matches_formula() {
    for &(window, overlap) in &[(1, 0), (2, 0), (2, 1), (3, 1), (4, 1), (4, 3), (5, 2), (10, 9), (200, 50)] {
        for len in 0..=45 {
            let chunks = sliding_window_chunk(&tokens(len), window, overlap).unwrap();
            assert_eq!(chunks.len(), expected_count(len, window, overlap), "len={len} window={window} overlap={overlap}");
        }
    }
}

#[test]
fn non_overlapping_parts_reconstruct_the_tokens() {
    for &(window, overlap) in &[(2, 0), (3, 1), (4, 2), (5, 4), (7, 3)] {
        for len in 1..=30 {
            let text = tokens(len);
            let chunks = sliding_window_chunk(&text, window, overlap).unwrap();
            let expected: Vec<String> = text.split(' ').map(str::to_string).collect();
            assert_eq!(reconstruct(&chunks, overlap), expected, "len={len} window={window} overlap={overlap}");
        }
    }
}

#[test]
fn stops_at_first_window_whose_unclamped_end_reaches_the_end() {
    // window 4, stride 2: windows end at 4, 6 (>= 5). No third window [4..5] even though the stride would reach it.
    let chunks = sliding_window_chunk("a b c d e", 4, 2).unwrap();
    assert_eq!(chunks, ["a b c d", "c d e"]);

    // Exact fit: the window ending at L is the last one.
    let chunks = sliding_window_chunk("a b c d e f", 4, 2).unwrap();
    assert_eq!(chunks, ["a b c d", "c d e f"]);
}

#[test]
fn shorter_than_window_yields_one_chunk() {
    assert_eq!(sliding_window_chunk("only three words", 200, 50).unwrap(), ["only three words"]);
}

#[test]
fn empty_and_whitespace_only_yield_nothing() {
    assert!(sliding_window_chunk("", 4, 1).unwrap().is_empty());
    assert!(sliding_window_chunk(" \n\t ", 4, 1).unwrap().is_empty());
}

#[test]
fn overlap_not_below_window_is_a_configuration_error() {
    for window in 1..=12 {
        for overlap in window..window + 3 {
            let err = sliding_window_chunk("a b c", window, overlap).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)), "window={window} overlap={overlap} got {err:?}");
        }
    }
    assert!(matches!(sliding_window_chunk("a b c", 0, 0), Err(Error::Configuration(_))));
    assert!(Chunker::new(ChunkingConfig { window_size: 3, overlap: 3 }).is_err());
}

#[test]
fn chunking_is_deterministic_and_normalizes_spacing() {
    let chunker = Chunker::new(ChunkingConfig { window_size: 3, overlap: 1 }).unwrap();
    let a = chunker.chunk_text("one  two\nthree four\t five");
    let b = chunker.chunk_text("one  two\nthree four\t five");
    assert_eq!(a, b);
    assert_eq!(a, ["one two three", "three four five"]);
}
