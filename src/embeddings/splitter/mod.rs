
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::loader::Document;

/// A piece of a rules document ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    /// The chunk text
    pub content: String,
    /// File the chunk was cut from
    pub source: PathBuf,
    /// Position of this chunk within its source document
    pub chunk_index: usize,
}

/// Configuration for recursive character splitting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next
    pub chunk_overlap: usize,
    /// Separators tried in order; an empty separator splits between characters
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
            separators: ["\n\n", "\n", " ", ""]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Split every document into chunks, preserving document order
#[inline]
pub fn split_documents(documents: &[Document], config: &SplitterConfig) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();

    for document in documents {
        let pieces = split_text(&document.content, config);
        debug!(
            "Split {} into {} chunks",
            document.source.display(),
            pieces.len()
        );

        chunks.extend(
            pieces
                .into_iter()
                .enumerate()
                .map(|(chunk_index, content)| DocumentChunk {
                    content,
                    source: document.source.clone(),
                    chunk_index,
                }),
        );
    }

    chunks
}

/// Split `text` into chunks of at most `chunk_size` characters where the
/// separators allow it, with up to `chunk_overlap` characters shared between
/// neighbours.
#[inline]
pub fn split_text(text: &str, config: &SplitterConfig) -> Vec<String> {
    split_recursive(text, &config.separators, config)
}

fn split_recursive(text: &str, separators: &[String], config: &SplitterConfig) -> Vec<String> {
    let mut chunks = Vec::new();

    // Use the first separator that occurs in the text, the empty one always does
    let mut separator = separators.last().map_or("", String::as_str);
    let mut remaining: &[String] = &[];
    for (i, candidate) in separators.iter().enumerate() {
        if candidate.is_empty() {
            separator = "";
            break;
        }
        if text.contains(candidate.as_str()) {
            separator = candidate;
            remaining = &separators[i + 1..];
            break;
        }
    }

    let mut small_pieces = Vec::new();
    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            small_pieces.push(piece);
            continue;
        }

        if !small_pieces.is_empty() {
            chunks.extend(merge_pieces(&small_pieces, config));
            small_pieces.clear();
        }

        if remaining.is_empty() {
            chunks.push(piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }

    if !small_pieces.is_empty() {
        chunks.extend(merge_pieces(&small_pieces, config));
    }

    chunks
}

/// Split on `separator`, keeping it attached to the start of the piece that
/// follows it. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Greedily merge small pieces into chunks, keeping a tail of at most
/// `chunk_overlap` characters from the previous chunk.
fn merge_pieces(pieces: &[&str], config: &SplitterConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for &piece in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size {
            if total > config.chunk_size {
                warn!(
                    "Created a chunk of size {}, which is longer than the specified {}",
                    total, config.chunk_size
                );
            }

            if !window.is_empty() {
                push_trimmed(&mut chunks, &window);

                // Drop pieces from the front until only the overlap remains
                // and the next piece fits
                while total > config.chunk_overlap
                    || (total + len > config.chunk_size && total > 0)
                {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }
        }

        window.push_back(piece);
        total += len;
    }

    push_trimmed(&mut chunks, &window);
    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
