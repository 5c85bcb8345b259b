//! Chunker — splits extracted resume text into overlapping fixed-size windows.
//!
//! Windows are measured in characters (Unicode scalar values), never bytes,
//! so a window boundary can't land inside a multi-byte character.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkParamsError {
    #[error("chunk size must be positive")]
    ZeroSize,

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Window length and overlap, both in characters. `overlap < size` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    size: usize,
    overlap: usize,
}

impl ChunkParams {
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkParamsError> {
        if size == 0 {
            return Err(ChunkParamsError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkParamsError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of consecutive windows.
    pub fn stride(&self) -> usize {
        self.size - self.overlap
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// One retrieval window. `start..end` are character offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Splits `text` into windows of `params.size()` characters advancing by
/// `params.stride()`. The last window stops at the end of the text and may be
/// shorter. Stops as soon as a window reaches the end, so no window is empty
/// and none is wholly contained in its predecessor.
pub fn chunk_text(text: &str, params: ChunkParams) -> Vec<Chunk> {
    // Byte offset of every character, plus the end of the string.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let char_count = boundaries.len();
    boundaries.push(text.len());

    let mut chunks = Vec::with_capacity(expected_chunk_count(char_count, params));
    let mut start = 0usize;

    while start < char_count {
        let end = (start + params.size).min(char_count);
        chunks.push(Chunk {
            index: chunks.len(),
            start,
            end,
            text: text[boundaries[start]..boundaries[end]].to_string(),
        });
        if end == char_count {
            break;
        }
        start += params.stride();
    }

    chunks
}

/// Number of chunks `chunk_text` produces for a text of `char_count` characters:
/// `ceil((n - overlap) / stride)` when `n > overlap`, one chunk for any shorter
/// non-empty text, none for empty text.
pub fn expected_chunk_count(char_count: usize, params: ChunkParams) -> usize {
    if char_count == 0 {
        return 0;
    }
    if char_count <= params.overlap {
        return 1;
    }
    (char_count - params.overlap).div_ceil(params.stride())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(size: usize, overlap: usize) -> ChunkParams {
        ChunkParams::new(size, overlap).unwrap()
    }

    fn sample_text(len: usize) -> String {
        "abcdefghijklmnopqrstuvwxyz0123456789"
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_params_reject_zero_size() {
        assert_eq!(ChunkParams::new(0, 0), Err(ChunkParamsError::ZeroSize));
    }

    #[test]
    fn test_params_reject_overlap_not_smaller_than_size() {
        assert_eq!(
            ChunkParams::new(100, 100),
            Err(ChunkParamsError::OverlapTooLarge {
                size: 100,
                overlap: 100
            })
        );
    }

    #[test]
    fn test_default_params_match_resume_defaults() {
        let p = ChunkParams::default();
        assert_eq!(p.size(), 1000);
        assert_eq!(p.overlap(), 200);
        assert_eq!(p.stride(), 800);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_text("", ChunkParams::default()).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("Rust engineer", params(1000, 200));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Rust engineer");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 13));
    }

    #[test]
    fn test_two_thousand_chars_at_default_params() {
        let text = sample_text(2000);
        let chunks = chunk_text(&text, params(1000, 200));

        let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(spans, vec![(0, 1000), (800, 1800), (1600, 2000)]);
        assert_eq!(chunks.len(), expected_chunk_count(2000, params(1000, 200)));
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text = sample_text(2500);
        let chunks = chunk_text(&text, params(1000, 200));
        for pair in chunks.windows(2) {
            let prev_tail: String = pair[0].text.chars().skip(800).collect();
            let next_head: String = pair[1].text.chars().take(prev_tail.chars().count()).collect();
            assert_eq!(prev_tail, next_head);
        }
    }

    #[test]
    fn test_every_character_is_covered() {
        for (len, size, overlap) in [(1, 3, 0), (7, 3, 1), (100, 10, 9), (999, 64, 16), (1000, 1000, 200)] {
            let text = sample_text(len);
            let chunks = chunk_text(&text, params(size, overlap));
            let mut covered = vec![false; len];
            for chunk in &chunks {
                assert!(!chunk.text.is_empty());
                for flag in &mut covered[chunk.start..chunk.end] {
                    *flag = true;
                }
            }
            assert!(covered.iter().all(|c| *c), "gap for len={len} size={size} overlap={overlap}");
        }
    }

    #[test]
    fn test_chunk_count_matches_formula() {
        for len in [1usize, 5, 199, 200, 201, 999, 1000, 1001, 1800, 1801, 4321] {
            let p = params(1000, 200);
            let chunks = chunk_text(&sample_text(len), p);
            assert_eq!(chunks.len(), expected_chunk_count(len, p), "len={len}");
            if len > p.overlap() {
                let formula = (len - p.overlap()).div_ceil(p.stride());
                assert_eq!(chunks.len(), formula, "len={len}");
            }
        }
    }

    #[test]
    fn test_zero_overlap_partitions_text() {
        let text = sample_text(25);
        let chunks = chunk_text(&text, params(10, 0));
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "héllo wörld — naïve café ✓".repeat(3);
        let chunks = chunk_text(&text, params(7, 2));
        let total_chars = text.chars().count();
        assert_eq!(chunks.last().unwrap().end, total_chars);
        for chunk in &chunks {
            assert_eq!(chunk.text.chars().count(), chunk.end - chunk.start);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = sample_text(3333);
        assert_eq!(
            chunk_text(&text, params(500, 50)),
            chunk_text(&text, params(500, 50))
        );
    }

    #[test]
    fn test_chunk_indices_are_sequential() {
        let chunks = chunk_text(&sample_text(5000), ChunkParams::default());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }
}
