//! # Text Chunking Module
//!
//! Splits a large combined text into bounded, overlapping chunks for
//! per-chunk summarization.
//!
//! ## Chunking Strategy
//!
//! 1. Cut the text into pieces no longer than `chunk_size - overlap`,
//!    trying separators coarsest first: paragraph break, line break,
//!    sentence end, space, and finally a hard character cut. A finer
//!    separator is only used inside a piece that is still too long.
//! 2. Pack pieces greedily into chunks, never exceeding `chunk_size`.
//! 3. Prefix every chunk after the first with the trailing `overlap`
//!    characters of its predecessor, so context survives the boundary.
//!
//! Separators stay attached to the piece they end, so removing each chunk's
//! overlap prefix and concatenating reproduces the input exactly. All sizes
//! count characters, never bytes, so multi-byte text is never split inside a
//! code point.

use crate::processor::ChunkOptions;
use crate::processor::error::ProcessError;
use serde::Serialize;
use tracing::{debug, instrument};

/// Separators in priority order, coarsest first
pub const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// A chunk of text with its position in the chunk set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position of the chunk; unique and increasing from zero
    pub index: usize,

    /// The chunk text, including the overlap prefix
    pub text: String,

    /// Number of leading characters repeated from the previous chunk
    pub overlap: usize,
}

impl Chunk {
    /// The text this chunk adds beyond its overlap prefix
    pub fn fresh_text(&self) -> &str {
        skip_chars(&self.text, self.overlap)
    }
}

/// Split text into overlapping chunks
///
/// # Arguments
///
/// * `text` - The text to split
/// * `options` - Chunk size and overlap, in characters
///
/// # Returns
///
/// The ordered chunk set; empty for empty or whitespace-only input
#[instrument(skip(text), fields(text_chars = text.chars().count()))]
pub fn split_text(text: &str, options: &ChunkOptions) -> Result<Vec<Chunk>, ProcessError> {
    options.validate()?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let piece_limit = options.chunk_size - options.overlap;
    let mut pieces = Vec::new();
    segment(text, SEPARATORS, piece_limit, &mut pieces);

    let mut chunks = Vec::new();
    let mut prefix = String::new();
    let mut prefix_chars = 0;
    let mut body = String::new();
    let mut body_chars = 0;

    for piece in pieces {
        let piece_chars = piece.chars().count();
        let capacity = options.chunk_size - prefix_chars;

        if body_chars > 0 && body_chars + piece_chars > capacity {
            let chunk_text = format!("{}{}", prefix, body);
            prefix = tail_chars(&chunk_text, options.overlap).to_string();
            chunks.push(Chunk {
                index: chunks.len(),
                text: chunk_text,
                overlap: prefix_chars,
            });
            prefix_chars = prefix.chars().count();
            body.clear();
            body_chars = 0;
        }

        body.push_str(piece);
        body_chars += piece_chars;
    }

    if body_chars > 0 {
        chunks.push(Chunk {
            index: chunks.len(),
            text: format!("{}{}", prefix, body),
            overlap: prefix_chars,
        });
    }

    debug!("Created {} chunks", chunks.len());
    Ok(chunks)
}

/// Rebuild the original text from a chunk set
pub fn reassemble(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::fresh_text).collect()
}

/// Recursively cut `text` into pieces of at most `limit` characters
fn segment<'a>(text: &'a str, separators: &[&str], limit: usize, out: &mut Vec<&'a str>) {
    if text.chars().count() <= limit {
        if !text.is_empty() {
            out.push(text);
        }
        return;
    }

    let Some(position) = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
    else {
        hard_cut(text, limit, out);
        return;
    };

    let separator = separators[position];
    if separator.is_empty() {
        hard_cut(text, limit, out);
        return;
    }

    let finer = &separators[position + 1..];
    for part in text.split_inclusive(separator) {
        segment(part, finer, limit, out);
    }
}

/// Cut into consecutive windows of `limit` characters
fn hard_cut<'a>(text: &'a str, limit: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (byte_idx, _) in text.char_indices() {
        if count == limit {
            out.push(&text[start..byte_idx]);
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}

fn skip_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte_idx, _)) => &text[byte_idx..],
        None => "",
    }
}

fn tail_chars(text: &str, n: usize) -> &str {
    let total = text.chars().count();
    skip_chars(text, total.saturating_sub(n))
}
