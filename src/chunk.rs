//! Sliding-window text chunker with structural break points.
//!
//! Splits page text into overlapping windows of at most `chunk_size`
//! characters. Within each window the split prefers a structural boundary
//! (paragraph break, sentence end, line end, word boundary, in that order)
//! and falls back to the raw character window when none qualifies.
//!
//! Consecutive chunks share exactly `overlap` characters: each chunk after
//! the first starts `overlap` characters before the previous chunk's end.
//! All arithmetic is in character units, so multi-byte code points are
//! never split.

use anyhow::Result;

use crate::models::Chunk;

/// Split text into overlapping character windows.
///
/// Returns no chunks for empty input. Fails when `chunk_size` is zero or
/// `overlap` is not strictly smaller than `chunk_size`.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        anyhow::bail!("chunk_size must be > 0");
    }
    if overlap >= chunk_size {
        anyhow::bail!("overlap ({}) must be < chunk_size ({})", overlap, chunk_size);
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let window_end = (start + chunk_size).min(total);
        let end = if window_end < total {
            break_point(&chars, start, window_end, overlap).unwrap_or(window_end)
        } else {
            window_end
        };
        chunks.push(chars[start..end].iter().collect());
        if end >= total {
            break;
        }
        // end - overlap > start holds because break_point only returns
        // positions past start + overlap, and the raw window is chunk_size
        // wide with chunk_size > overlap.
        start = end - overlap;
    }

    Ok(chunks)
}

/// Chunk a document's pages, attaching source and 1-based page provenance.
/// Pages that are empty after trimming produce no chunks.
pub fn chunk_pages(
    source: &str,
    pages: &[String],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        for window in split_text(page, chunk_size, overlap)? {
            chunks.push(Chunk::new(window, source, i + 1));
        }
    }
    Ok(chunks)
}

/// Find the best structural break position in `chars[start..window_end]`.
///
/// A candidate must lie past `start + overlap` (so the next window still
/// advances) and past the first third of the window (so chunks do not
/// collapse to slivers around dense punctuation). Returns the rightmost
/// paragraph break if any, otherwise the rightmost sentence end, line end,
/// or word boundary.
fn break_point(chars: &[char], start: usize, window_end: usize, overlap: usize) -> Option<usize> {
    let window = window_end - start;
    let floor = start + (window / 3).max(overlap + 1);

    let mut sentence = None;
    let mut newline = None;
    let mut space = None;

    let mut p = window_end;
    while p > floor {
        let last = chars[p - 1];
        let prev = if p >= 2 { Some(chars[p - 2]) } else { None };
        if last == '\n' && prev == Some('\n') {
            return Some(p);
        }
        if sentence.is_none()
            && (last == ' ' || last == '\n')
            && matches!(prev, Some('.') | Some('!') | Some('?'))
        {
            sentence = Some(p);
        }
        if newline.is_none() && last == '\n' {
            newline = Some(p);
        }
        if space.is_none() && last == ' ' {
            space = Some(p);
        }
        p -= 1;
    }

    sentence.or(newline).or(space)
}
