//! ragpipe-store
//!
//! The document store: an in-memory hybrid index over embedded document
//! chunks. Dense similarity (cosine) and sparse lexical overlap are blended
//! with a store-level weighting into a single ranking. A single `RwLock`
//! guards the interior, so an upsert is all-or-nothing and every query sees
//! a consistent snapshot.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod sparse;

use std::collections::HashMap;
use std::sync::RwLock;

use ragpipe_core::config::HybridWeights;
use ragpipe_core::error::{Error, Result};
use ragpipe_core::types::{ChunkId, DocumentChunk, RetrievedFragment};

use crate::sparse::{tokenize, SparseScorer};

pub struct DocumentStore {
    dim: usize,
    weights: HybridWeights,
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    /// Chunks in ingestion order; ranking ties resolve to this order.
    chunks: Vec<DocumentChunk>,
    by_id: HashMap<ChunkId, usize>,
}

impl DocumentStore {
    pub fn new(dim: usize, weights: HybridWeights) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("store dimension must be > 0".to_string()));
        }
        weights.validate()?;
        Ok(Self { dim, weights, inner: RwLock::new(StoreInner::default()) })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Insert or replace chunks, atomically: either every chunk lands or
    /// none does. Replacement keys off the chunk id, i.e.
    /// `(source_file, sequence_index)`.
    pub fn upsert(&self, chunks: &[DocumentChunk]) -> Result<()> {
        for chunk in chunks {
            if chunk.embedding.len() != self.dim {
                return Err(Error::InvalidVector { expected: self.dim, got: chunk.embedding.len() });
            }
        }
        let mut inner = self.write_lock()?;
        for chunk in chunks {
            match inner.by_id.get(&chunk.id).copied() {
                Some(pos) => inner.chunks[pos] = chunk.clone(),
                None => {
                    let pos = inner.chunks.len();
                    inner.chunks.push(chunk.clone());
                    inner.by_id.insert(chunk.id.clone(), pos);
                }
            }
        }
        tracing::debug!(upserted = chunks.len(), total = inner.chunks.len(), "store upsert");
        Ok(())
    }

    /// Atomically swap every chunk of one source file for `chunks`, under a
    /// single write lock. Unlike `upsert`, a shrunken document leaves no
    /// stale trailing chunks behind; queries see either the old version or
    /// the new one, never a mix.
    pub fn replace_document(&self, file_name: &str, chunks: &[DocumentChunk]) -> Result<()> {
        for chunk in chunks {
            if chunk.embedding.len() != self.dim {
                return Err(Error::InvalidVector { expected: self.dim, got: chunk.embedding.len() });
            }
        }
        let mut inner = self.write_lock()?;
        inner.chunks.retain(|c| c.source_file != file_name);
        inner.chunks.extend(chunks.iter().cloned());
        inner.by_id = inner
            .chunks
            .iter()
            .enumerate()
            .map(|(pos, c)| (c.id.clone(), pos))
            .collect();
        tracing::debug!(file_name, replaced_with = chunks.len(), "store replace");
        Ok(())
    }

    /// Hybrid ranking over a consistent snapshot. Returns at most `k`
    /// fragments in descending score order; fewer than `k` is valid when
    /// the store holds fewer matches.
    pub fn hybrid_query(
        &self,
        query_text: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedFragment>> {
        if query_embedding.len() != self.dim {
            return Err(Error::InvalidVector { expected: self.dim, got: query_embedding.len() });
        }
        let inner = self.read_lock()?;

        let query_terms = tokenize(query_text);
        let scorer = SparseScorer::new(
            &query_terms,
            inner.chunks.iter().map(|c| c.sparse_terms.as_slice()),
            inner.chunks.len(),
        );

        let mut scored: Vec<(f32, &DocumentChunk)> = inner
            .chunks
            .iter()
            .map(|chunk| {
                let dense = cosine(query_embedding, &chunk.embedding);
                let lexical = scorer.score(&chunk.sparse_terms);
                (self.weights.dense * dense + self.weights.sparse * lexical, chunk)
            })
            .collect();
        // Stable sort keeps ingestion order for tied scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (score, chunk))| RetrievedFragment {
                chunk: chunk.clone(),
                relevance_score: score,
                rank,
            })
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_lock()?.chunks.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Distinct source files in first-ingested order.
    pub fn document_names(&self) -> Result<Vec<String>> {
        let inner = self.read_lock()?;
        let mut names = Vec::new();
        for chunk in &inner.chunks {
            if !names.contains(&chunk.source_file) {
                names.push(chunk.source_file.clone());
            }
        }
        Ok(names)
    }

    /// Drop every chunk of one source file. Returns the number removed.
    pub fn remove_document(&self, file_name: &str) -> Result<usize> {
        let mut inner = self.write_lock()?;
        let before = inner.chunks.len();
        inner.chunks.retain(|c| c.source_file != file_name);
        inner.by_id = inner
            .chunks
            .iter()
            .enumerate()
            .map(|(pos, c)| (c.id.clone(), pos))
            .collect();
        let removed = before - inner.chunks.len();
        if removed > 0 {
            tracing::info!(file_name, removed, "removed document from store");
        }
        Ok(removed)
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|e| Error::StoreUnavailable(format!("store lock poisoned: {e}")))
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|e| Error::StoreUnavailable(format!("store lock poisoned: {e}")))
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na <= 0.0 || nb <= 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
