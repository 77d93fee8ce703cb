//! Exact (linear-scan) vector index with snapshot reads.
//!
//! Readers load an immutable snapshot through `arc-swap` and never block.
//! Writers are serialized by a mutex, validate the whole batch against the
//! current snapshot, then publish a new snapshot in a single store. A reader
//! therefore sees either all of an appended batch or none of it.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::types::{IndexedChunk, RetrievalResult, ScoredChunk};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Immutable view of the index contents.
#[derive(Debug, Default)]
struct Snapshot {
    /// Entries in insertion order.
    entries: Vec<Arc<IndexedChunk>>,
    /// Dimensionality shared by every entry, fixed by the first append.
    dimensions: Option<usize>,
}

/// In-memory vector index over [`IndexedChunk`] entries.
///
/// `top_k` is a full scan, O(n·d) per query, which is plenty for the few
/// hundred chunks a pasted document produces. Nothing in the public contract
/// depends on storage order beyond the documented tie-break, so an ANN
/// structure can replace the scan later.
pub struct VectorIndex {
    snapshot: ArcSwap<Snapshot>,
    write_lock: Mutex<()>,
    metric: DistanceMetric,
}

/// Statistics about an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of entries.
    pub entry_count: usize,
    /// Shared dimensionality, if any entry exists.
    pub dimensions: Option<usize>,
    /// Metric used for scoring.
    pub metric: DistanceMetric,
    /// Approximate memory held by vectors and text, in bytes.
    pub memory_bytes: usize,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.load();
        f.debug_struct("VectorIndex")
            .field("entries", &snapshot.entries.len())
            .field("dimensions", &snapshot.dimensions)
            .field("metric", &self.metric)
            .finish()
    }
}

impl VectorIndex {
    /// Create an empty cosine-similarity index.
    pub fn new() -> Self {
        Self::with_metric(DistanceMetric::Cosine)
    }

    /// Create an empty index scored with `metric`.
    pub fn with_metric(metric: DistanceMetric) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            write_lock: Mutex::new(()),
            metric,
        }
    }

    /// Build an index from already-embedded entries in one append.
    pub fn from_entries<I>(entries: I, metric: DistanceMetric) -> Result<Self>
    where
        I: IntoIterator<Item = IndexedChunk>,
    {
        let index = Self::with_metric(metric);
        index.append(entries)?;
        Ok(index)
    }

    /// The scoring metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.snapshot.load().entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of stored vectors, `None` while empty.
    pub fn dimensions(&self) -> Option<usize> {
        self.snapshot.load().dimensions
    }

    /// Append a batch of entries.
    ///
    /// The batch is all-or-nothing: if any entry has a different length from
    /// the existing entries (or from the first entry of the batch when the
    /// index is empty), or holds an empty or non-finite vector, nothing is
    /// added.
    ///
    /// Returns the number of entries added.
    #[instrument(skip(self, entries), fields(metric = %self.metric))]
    pub fn append<I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = IndexedChunk>,
    {
        let batch: Vec<IndexedChunk> = entries.into_iter().collect();
        if batch.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock();
        let current = self.snapshot.load_full();

        let mut dimensions = current.dimensions;
        for entry in &batch {
            validate_vector(&entry.embedding)?;
            match dimensions {
                Some(expected) if expected != entry.dimensions() => {
                    return Err(Error::DimensionMismatch {
                        expected,
                        actual: entry.dimensions(),
                    });
                }
                Some(_) => {}
                None => dimensions = Some(entry.dimensions()),
            }
        }

        let added = batch.len();
        let mut next = Vec::with_capacity(current.entries.len() + added);
        next.extend(current.entries.iter().cloned());
        next.extend(batch.into_iter().map(Arc::new));

        self.snapshot.store(Arc::new(Snapshot {
            entries: next,
            dimensions,
        }));

        debug!(added, total = current.entries.len() + added, "Appended batch");
        Ok(added)
    }

    /// Return the `k` entries most similar to `query`.
    ///
    /// Results are sorted by descending score. Ties are broken by ascending
    /// chunk ordinal, then by insertion order. If fewer than `k` entries exist
    /// all of them are returned. An empty index yields an empty result.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidK`] if `k == 0`
    /// - [`Error::DimensionMismatch`] if `query` disagrees with stored vectors
    /// - [`Error::InvalidVector`] if `query` contains NaN or infinity
    #[instrument(skip(self, query), fields(dim = query.len()))]
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::InvalidK(k));
        }

        let snapshot = self.snapshot.load_full();
        let Some(dimensions) = snapshot.dimensions else {
            return Ok(RetrievalResult::empty());
        };

        if query.len() != dimensions {
            return Err(Error::DimensionMismatch {
                expected: dimensions,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "Query vector contains NaN or Inf".to_string(),
            ));
        }

        let mut scored: Vec<(f64, usize)> = snapshot
            .entries
            .iter()
            .enumerate()
            // Adding 0.0 folds -0.0 into 0.0 so total_cmp treats them as equal.
            .map(|(pos, entry)| (self.metric.similarity(query, &entry.embedding) + 0.0, pos))
            .collect();

        let rank = |a: &(f64, usize), b: &(f64, usize)| -> Ordering {
            b.0.total_cmp(&a.0)
                .then_with(|| {
                    let oa = snapshot.entries[a.1].chunk.ordinal;
                    let ob = snapshot.entries[b.1].chunk.ordinal;
                    oa.cmp(&ob)
                })
                .then_with(|| a.1.cmp(&b.1))
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);

        let hits: Vec<ScoredChunk> = scored
            .into_iter()
            .map(|(score, pos)| ScoredChunk {
                chunk: snapshot.entries[pos].chunk.clone(),
                score,
            })
            .collect();

        debug!(results = hits.len(), scanned = snapshot.entries.len(), "Top-k search completed");
        Ok(RetrievalResult::new(hits))
    }

    /// Export all entries in insertion order.
    ///
    /// Used to serialize an index into a transport payload; feeding the result
    /// back through [`VectorIndex::from_entries`] rebuilds an equivalent index.
    pub fn entries(&self) -> Vec<IndexedChunk> {
        self.snapshot
            .load()
            .entries
            .iter()
            .map(|e| IndexedChunk::clone(e))
            .collect()
    }

    /// Get index statistics.
    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot.load();
        let memory_bytes = snapshot
            .entries
            .iter()
            .map(|e| e.embedding.len() * std::mem::size_of::<f32>() + e.chunk.text.len())
            .sum();

        IndexStats {
            entry_count: snapshot.entries.len(),
            dimensions: snapshot.dimensions,
            metric: self.metric,
            memory_bytes,
        }
    }
}

fn validate_vector(vector: &[f32]) -> Result<()> {
    if vector.is_empty() {
        return Err(Error::InvalidVector("Vector is empty".to_string()));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidVector(
            "Vector contains NaN or Inf".to_string(),
        ));
    }
    Ok(())
}
