//! Overlapping-window text segmenter.
//!
//! Splits raw document text into chunks of at most `chunk_size` bytes,
//! with each chunk re-including the trailing `chunk_overlap` bytes of its
//! predecessor so context spanning a boundary survives retrieval.
//!
//! Splitting is hierarchical: paragraphs (`\n\n`), then lines, then
//! sentences (`. `), then words, then raw characters, descending only while
//! a unit still exceeds `chunk_size`. Separators stay attached to their
//! preceding unit, so concatenating the chunks (overlaps removed) yields the
//! original text. Splits never land inside a UTF-8 sequence.

use anyhow::Result;

use crate::error::RagError;

/// Separators tried in order when a unit exceeds the chunk size.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Split `text` into overlapping chunks of at most `chunk_size` bytes.
///
/// Requires `chunk_overlap < chunk_size`. Whitespace-only input yields an
/// empty vec; input that already fits yields exactly one chunk with no
/// overlap. Deterministic for identical inputs and parameters.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 || chunk_overlap >= chunk_size {
        return Err(RagError::Config(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        ))
        .into());
    }

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut units = Vec::new();
    collect_units(text, 0, chunk_size, &mut units);

    let mut chunks = Vec::new();
    let mut current = String::new();

    for unit in units {
        if !current.is_empty() && current.len() + unit.len() > chunk_size {
            // Carry at most `chunk_overlap` trailing bytes into the next
            // chunk, shrinking the carry if the incoming unit is large so
            // the new chunk still fits.
            let budget = chunk_size.saturating_sub(unit.len());
            let tail = overlap_tail(&current, chunk_overlap.min(budget)).to_string();
            chunks.push(std::mem::take(&mut current));
            current = tail;
        }
        current.push_str(unit);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}

/// Recursively break `piece` into units no larger than `max` bytes,
/// preferring coarse separators and falling back to character splits.
fn collect_units<'a>(piece: &'a str, level: usize, max: usize, out: &mut Vec<&'a str>) {
    if piece.is_empty() {
        return;
    }
    if piece.len() <= max {
        out.push(piece);
        return;
    }
    if level >= SEPARATORS.len() {
        hard_split(piece, max, out);
        return;
    }

    let sep = SEPARATORS[level];
    if piece.contains(sep) {
        for part in piece.split_inclusive(sep) {
            collect_units(part, level + 1, max, out);
        }
    } else {
        collect_units(piece, level + 1, max, out);
    }
}

/// Last-resort split at `max`-byte boundaries, backed off to the nearest
/// char boundary.
fn hard_split<'a>(piece: &'a str, max: usize, out: &mut Vec<&'a str>) {
    let mut rest = piece;
    while rest.len() > max {
        let mut cut = max;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // A single char wider than `max`; emit it whole.
            cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }
        out.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        out.push(rest);
    }
}

/// Trailing slice of at most `max_tail` bytes, aligned to a char boundary.
fn overlap_tail(chunk: &str, max_tail: usize) -> &str {
    if max_tail == 0 {
        return "";
    }
    if chunk.len() <= max_tail {
        return chunk;
    }
    let mut start = chunk.len() - max_tail;
    while !chunk.is_char_boundary(start) {
        start += 1;
    }
    &chunk[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo the overlap carry: strip the longest shared prefix (up to
    /// `overlap` bytes) from each chunk after the first and concatenate.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = chunks[0].clone();
        for next in &chunks[1..] {
            let mut k = overlap.min(out.len()).min(next.len());
            while k > 0 && !(next.is_char_boundary(k) && out.ends_with(&next[..k])) {
                k -= 1;
            }
            out.push_str(&next[k..]);
        }
        out
    }

    #[test]
    fn short_input_single_chunk() {
        let chunks = split_text("Hello, world!", 500, 50).unwrap();
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn empty_input_no_chunks() {
        assert!(split_text("", 500, 50).unwrap().is_empty());
        assert!(split_text("   \n\n  ", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn invalid_overlap_rejected() {
        assert!(split_text("text", 10, 10).is_err());
        assert!(split_text("text", 10, 12).is_err());
        assert!(split_text("text", 0, 0).is_err());
    }

    #[test]
    fn chunks_respect_size_limit() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let chunks = split_text(&text, 120, 20).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 120, "chunk too large: {} bytes", chunk.len());
        }
    }

    #[test]
    fn paragraphs_packed_together_when_they_fit() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = split_text(text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn adjacent_chunks_share_overlap() {
        let text = "Alpha sentence one. Beta sentence two. Gamma sentence three. \
                    Delta sentence four. Epsilon sentence five."
            .to_string();
        let chunks = split_text(&text, 60, 15).unwrap();
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail_start = pair[0].len().saturating_sub(15);
            let tail = &pair[0][tail_start..];
            // The next chunk begins with some suffix of the previous one.
            assert!(
                (1..=tail.len()).rev().any(|k| pair[1].starts_with(&tail[tail.len() - k..])),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn overlaps_removed_reconstruct_original() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
                    Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. \
                    Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris."
            .to_string();
        for (size, overlap) in [(50, 10), (80, 0), (64, 30)] {
            let chunks = split_text(&text, size, overlap).unwrap();
            assert_eq!(
                reconstruct(&chunks, overlap),
                text,
                "reconstruction failed for size={} overlap={}",
                size,
                overlap
            );
        }
    }

    #[test]
    fn every_chunk_adds_fresh_text() {
        // A chunk must always extend past whatever overlap it carried from
        // its predecessor; a chunk that is purely a repeated suffix would be
        // a redundant retrieval candidate.
        let text = "Short words mixed with considerablylongertokens and more \
                    filler text to force many flushes at varied budgets. "
            .repeat(8);
        for (size, overlap) in [(40, 20), (60, 30), (100, 50)] {
            let chunks = split_text(&text, size, overlap).unwrap();
            for pair in chunks.windows(2) {
                let next = &pair[1];
                let mut k = overlap.min(pair[0].len()).min(next.len());
                while k > 0 && !(next.is_char_boundary(k) && pair[0].ends_with(&next[..k])) {
                    k -= 1;
                }
                assert!(
                    next.len() > k,
                    "chunk is only carried overlap (size={}, overlap={}): {:?}",
                    size,
                    overlap,
                    next
                );
            }
        }
    }

    #[test]
    fn unbroken_run_hard_splits_without_panicking() {
        let text = "x".repeat(1000);
        let chunks = split_text(&text, 100, 10).unwrap();
        for chunk in &chunks {
            assert!(chunk.len() <= 100);
        }
        // Hard-split units fill each chunk exactly, so no overlap is carried
        // and plain concatenation recovers the input.
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "日本語のテキストです。".repeat(30);
        let chunks = split_text(&text, 50, 12).unwrap();
        for chunk in &chunks {
            assert!(chunk.len() <= 50);
            // Slicing would have panicked already; this is belt and braces.
            assert!(std::str::from_utf8(chunk.as_bytes()).is_ok());
        }
    }

    #[test]
    fn deterministic_for_identical_input() {
        let text = "Paragraph one.\n\nParagraph two.\n\nParagraph three.".repeat(10);
        let a = split_text(&text, 90, 20).unwrap();
        let b = split_text(&text, 90, 20).unwrap();
        assert_eq!(a, b);
    }
}
