use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type TermId = u32;

/// Sparse non-negative term weights over a fixed vocabulary dimension.
///
/// Entries are kept sorted by term id with no duplicates and no zero weights,
/// so two vectors built from the same weights compare bit-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermVector {
    dim: usize,
    entries: Vec<(TermId, f32)>,
}

impl TermVector {
    pub fn zero(dim: usize) -> Self {
        Self { dim, entries: Vec::new() }
    }

    /// Build a vector from raw (term, weight) pairs. Duplicate ids are summed.
    pub fn new(dim: usize, weights: impl IntoIterator<Item = (TermId, f32)>) -> Result<Self> {
        let mut entries: Vec<(TermId, f32)> = Vec::new();
        for (tid, w) in weights {
            if tid as usize >= dim {
                return Err(Error::InvalidArgument(format!("term id {tid} outside dimension {dim}")));
            }
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidArgument(format!("weight {w} for term {tid} is not a finite non-negative number")));
            }
            entries.push((tid, w));
        }
        entries.sort_by_key(|(tid, _)| *tid);
        let mut merged: Vec<(TermId, f32)> = Vec::with_capacity(entries.len());
        for (tid, w) in entries {
            if let Some((last, acc)) = merged.last_mut() {
                if *last == tid {
                    *acc += w;
                    continue;
                }
            }
            merged.push((tid, w));
        }
        merged.retain(|(_, w)| *w > 0.0);
        Ok(Self { dim, entries: merged })
    }

    /// Scale to unit L2 length. The zero vector stays zero.
    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in self.entries.iter_mut() { *w /= norm; }
        }
        self
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn nnz(&self) -> usize { self.entries.len() }

    pub fn is_zero(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn get(&self, tid: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&tid, |(t, _)| *t)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Sparse dot product by merging the two sorted entry lists.
    pub fn dot(&self, other: &TermVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }

    /// Dot product against a dense row of the same dimension.
    pub fn dot_dense(&self, row: &[f32]) -> f32 {
        self.entries
            .iter()
            .map(|(tid, w)| row.get(*tid as usize).copied().unwrap_or(0.0) * w)
            .sum()
    }
}
