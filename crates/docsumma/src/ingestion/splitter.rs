//! Recursive character splitter with overlap
//!
//! Splits on the coarsest separator present (paragraphs, lines, sentences,
//! words), keeping each separator on the end of the piece before it,
//! recursing into pieces that are still too long, then greedily
//! merges pieces back up to `chunk_size` characters while carrying up to
//! `chunk_overlap` characters of trailing pieces into the next chunk.

use unicode_segmentation::UnicodeSegmentation;

use crate::types::Chunk;

const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Text splitter configured with a size, an overlap and a separator ladder
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    /// Create a splitter. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into chunk strings, each at most `chunk_size` characters
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split text into `Chunk`s with character offsets into `text`
    pub fn split_into_chunks(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut search_from = 0usize;

        for (i, piece) in self.split_text(text).into_iter().enumerate() {
            let byte_start = text[search_from..]
                .find(&piece)
                .map(|p| p + search_from)
                .or_else(|| text.find(&piece))
                .unwrap_or(search_from);
            let char_start = text[..byte_start].chars().count();

            search_from = byte_start + piece.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
            while search_from < text.len() && !text.is_char_boundary(search_from) {
                search_from += 1;
            }
            search_from = search_from.min(text.len());

            chunks.push(Chunk::new(i as u32, piece, char_start));
        }

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator present in the text; "" always matches
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keep_separator(text, separator);

        let mut good_splits: Vec<String> = Vec::new();
        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }
            if remaining.is_empty() {
                if let Some(trimmed) = non_blank(&piece) {
                    final_chunks.push(trimmed);
                }
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedy merge of consecutive pieces; pieces already carry their
    /// separator so they are joined with nothing
    fn merge_splits(&self, splits: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut window: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(doc) = non_blank(&window.iter().copied().collect::<String>()) {
                    docs.push(doc);
                }

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            total += len;
        }

        if let Some(doc) = non_blank(&window.iter().copied().collect::<String>()) {
            docs.push(doc);
        }

        docs
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new(500, 50)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split on `separator`, attaching it to the end of the preceding piece so
/// sentence punctuation stays with its sentence.
/// The empty separator splits into grapheme clusters.
fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.graphemes(true).map(|g| g.to_string()).collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0usize;
    for (idx, _) in text.match_indices(separator) {
        let end = idx + separator.len();
        pieces.push(text[last..end].to_string());
        last = end;
    }
    if last < text.len() {
        pieces.push(text[last..].to_string());
    }

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}
