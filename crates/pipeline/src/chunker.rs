//! Sliding-window text chunker with boundary heuristics.
//!
//! Splits document text into overlapping segments of at most `chunk_size`
//! characters. Window ends are pulled back to the last line break in the
//! second half of the window when one exists, else to the last sentence
//! period in the second half, else left at the hard boundary. Each chunk
//! after the first repeats the trailing `overlap` characters of its
//! predecessor.
//!
//! The boundary heuristic is approximate, not a parser. The hard
//! invariants are: no chunk exceeds `chunk_size` characters, consecutive
//! chunks overlap by `overlap` characters (less only when the scan must be
//! clamped forward to make progress), and the non-overlapping portions
//! concatenate back to the original text. Same input and parameters always
//! produce the same chunks.

use contextmill_core::error::ChunkError;
use tracing::trace;

/// One chunk of a document, with character offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub text: String,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
}

/// Split `text` into overlapping chunk spans.
///
/// Returns a single span covering the whole text when it already fits in
/// one window. Rejects `chunk_size == 0` and `overlap >= chunk_size`
/// (a non-advancing window) as configuration errors.
pub fn chunk_document(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<ChunkSpan>, ChunkError> {
    if chunk_size == 0 {
        return Err(ChunkError::ZeroChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkError::OverlapTooLarge {
            chunk_size,
            overlap,
        });
    }

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len <= chunk_size {
        return Ok(vec![ChunkSpan {
            text: text.to_string(),
            start: 0,
            end: len,
        }]);
    }

    let mut spans = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + chunk_size).min(len);
        let mut end = hard_end;

        if end < len {
            // Prefer a line break in the second half of the window, then a
            // sentence period; otherwise keep the hard boundary.
            let midpoint = start + chunk_size / 2;
            if let Some(pos) = rfind_in(&chars, start, hard_end, '\n').filter(|&p| p > midpoint) {
                end = pos + 1;
            } else if let Some(pos) =
                rfind_in(&chars, start, hard_end, '.').filter(|&p| p > midpoint)
            {
                end = pos + 1;
            }
        }

        trace!(start, end, "chunk window");
        spans.push(ChunkSpan {
            text: chars[start..end].iter().collect(),
            start,
            end,
        });

        if end >= len {
            break;
        }

        // Overlap with the previous chunk, clamped so the scan always
        // advances even when the boundary was pulled back near the
        // window midpoint.
        start = end.saturating_sub(overlap).max(start + 1);
    }

    Ok(spans)
}

/// Convenience wrapper returning just the chunk texts.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    Ok(chunk_document(text, chunk_size, overlap)?
        .into_iter()
        .map(|s| s.text)
        .collect())
}

/// Index of the last occurrence of `needle` in `chars[start..end)`.
fn rfind_in(chars: &[char], start: usize, end: usize, needle: char) -> Option<usize> {
    chars[start..end]
        .iter()
        .rposition(|&c| c == needle)
        .map(|rel| start + rel)
}
