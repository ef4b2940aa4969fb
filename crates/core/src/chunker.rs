use serde::{Deserialize, Serialize};

use crate::error::{Result, SpoilerError};

/// Unit the chunk budget is counted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnit {
    #[default]
    Chars,
    Words,
}

/// Split a transcript into consecutive slices of at most `chunk_size` units.
///
/// The chunks partition the input: joining them gives back the transcript
/// byte for byte. In `Words` mode whitespace after a word stays in that
/// word's chunk, and leading whitespace belongs to the first chunk.
pub fn chunk_transcript(text: &str, chunk_size: usize, unit: ChunkUnit) -> Result<Vec<&str>> {
    if chunk_size == 0 {
        return Err(SpoilerError::InvalidChunkSize);
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let boundaries = match unit {
        ChunkUnit::Chars => char_boundaries(text, chunk_size),
        ChunkUnit::Words => word_boundaries(text, chunk_size),
    };

    let mut chunks = Vec::with_capacity(boundaries.len() + 1);
    let mut from = 0;
    for to in boundaries {
        chunks.push(&text[from..to]);
        from = to;
    }
    if from < text.len() {
        chunks.push(&text[from..]);
    }
    Ok(chunks)
}

fn char_boundaries(text: &str, chunk_size: usize) -> Vec<usize> {
    text.char_indices()
        .map(|(idx, _)| idx)
        .enumerate()
        .filter(|(n, _)| *n > 0 && n % chunk_size == 0)
        .map(|(_, idx)| idx)
        .collect()
}

/// Cut points sit at the start of every `chunk_size`-th word.
fn word_boundaries(text: &str, chunk_size: usize) -> Vec<usize> {
    let mut cuts = Vec::new();
    let mut words = 0usize;
    let mut prev_ws = true;

    for (idx, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        if prev_ws && !ws {
            if words > 0 && words % chunk_size == 0 {
                cuts.push(idx);
            }
            words += 1;
        }
        prev_ws = ws;
    }
    cuts
}
