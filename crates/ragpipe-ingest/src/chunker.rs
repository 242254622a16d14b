//! Deterministic character-based chunking with a fixed overlap.
//!
//! For text of `L` characters, `chunk_size` `s` and `chunk_overlap` `o`
//! (`o < s`), the split yields `ceil((L - o) / (s - o))` chunks (one chunk
//! when `L <= s`, none when the text is empty), and concatenating the
//! chunks with the leading `o` characters of every chunk after the first
//! removed reconstructs the input exactly.

use ragpipe_core::config::ChunkingConfig;

pub fn chunk_text(text: &str, cfg: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let size = cfg.chunk_size;
    let step = size - cfg.chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end >= chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Closed-form count matching `chunk_text`.
pub fn expected_chunk_count(text_len: usize, cfg: &ChunkingConfig) -> usize {
    if text_len == 0 {
        return 0;
    }
    if text_len <= cfg.chunk_size {
        return 1;
    }
    let step = cfg.chunk_size - cfg.chunk_overlap;
    (text_len - cfg.chunk_overlap).div_ceil(step)
}
