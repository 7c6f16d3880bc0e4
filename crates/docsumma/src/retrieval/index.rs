//! In-memory cosine-similarity index over one document's chunks

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::types::{Chunk, SourceChunk};

struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
    norm: f32,
}

/// Exhaustive top-K vector index. Entries keep chunk order.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index from `(chunk, embedding)` pairs.
    ///
    /// Empty, zero-norm, non-finite and wrong-dimension vectors are
    /// discarded; the first usable vector fixes the dimension. Returns
    /// `None` when nothing usable remains.
    pub fn build(embedded: impl IntoIterator<Item = (Chunk, Vec<f32>)>) -> Option<Self> {
        let mut entries = Vec::new();
        let mut dimensions = 0usize;
        let mut discarded = 0usize;

        for (chunk, vector) in embedded {
            let norm = l2_norm(&vector);
            let usable = !vector.is_empty()
                && norm > 0.0
                && norm.is_finite()
                && (dimensions == 0 || vector.len() == dimensions);

            if !usable {
                discarded += 1;
                continue;
            }

            dimensions = vector.len();
            entries.push(IndexEntry { chunk, vector, norm });
        }

        if discarded > 0 {
            tracing::warn!("Discarded {} unusable embeddings", discarded);
        }

        if entries.is_empty() {
            None
        } else {
            Some(Self { entries, dimensions })
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Top-`k` chunks by cosine similarity, highest first; ties keep chunk order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SourceChunk>> {
        if query.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "query embedding has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let query_norm = l2_norm(query);

        let mut results: Vec<SourceChunk> = self
            .entries
            .iter()
            .map(|entry| SourceChunk {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(query, query_norm, &entry.vector, entry.norm),
            })
            .collect();

        // stable sort
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_similarity(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}
