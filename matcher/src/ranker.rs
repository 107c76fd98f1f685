use serde::{Deserialize, Serialize};

use crate::corpus::CorpusEntry;
use crate::error::{Error, Mismatch, Result};
use crate::vector::TermVector;

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 1-based position in the result list.
    pub rank: usize,
    pub id: String,
    pub category: String,
    /// Cosine similarity in [0, 1].
    pub similarity: f32,
}

/// Cosine of the angle between two vectors. Does not assume unit length;
/// a zero vector on either side scores 0.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f32 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(0.0, 1.0)
}

/// Return the `k` pool entries most similar to `query`, best first.
///
/// Equal similarities keep pool order. An empty pool yields an empty list and
/// `k` larger than the pool returns every entry.
pub fn rank<'a, I>(query: &TermVector, pool: I, k: usize) -> Result<Vec<MatchResult>>
where
    I: IntoIterator<Item = &'a CorpusEntry>,
{
    if k == 0 {
        return Err(Error::InvalidArgument("k must be positive".into()));
    }

    let mut scored: Vec<(&CorpusEntry, f32)> = Vec::new();
    for entry in pool {
        let vector = entry.vector();
        if vector.dim() != query.dim() {
            return Err(Mismatch::Dimension { what: "corpus vector", expected: query.dim(), found: vector.dim() }.into());
        }
        scored.push((entry, cosine_similarity(query, vector)));
    }
    // sort_by is stable, so ties stay in pool order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(scored
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, (entry, similarity))| MatchResult {
            rank: i + 1,
            id: entry.id.clone(),
            category: entry.category.clone(),
            similarity,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;

    fn entry(id: &str, dim: usize, w: &[(u32, f32)]) -> CorpusEntry {
        let vector = TermVector::new(dim, w.iter().copied()).unwrap().normalized();
        CorpusEntry { id: id.into(), category: "Python Developer".into(), document: Document::from_parts(String::new(), String::new(), vector) }
    }

    #[test]
    fn cosine_of_self_is_one() {
        let v = TermVector::new(3, vec![(0, 0.3), (2, 7.0)]).unwrap();
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_does_not_assume_unit_length() {
        let a = TermVector::new(2, vec![(0, 10.0)]).unwrap();
        let b = TermVector::new(2, vec![(0, 2.0), (1, 2.0)]).unwrap();
        assert!((cosine_similarity(&a, &b) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let z = TermVector::zero(3);
        let v = TermVector::new(3, vec![(1, 1.0)]).unwrap();
        assert_eq!(cosine_similarity(&z, &v), 0.0);
        assert_eq!(cosine_similarity(&z, &z), 0.0);
    }

    #[test]
    fn ranks_descending_with_dense_positions() {
        let pool = vec![
            entry("a", 3, &[(2, 1.0)]),
            entry("b", 3, &[(0, 1.0)]),
            entry("c", 3, &[(0, 1.0), (2, 1.0)]),
        ];
        let q = TermVector::new(3, vec![(0, 1.0)]).unwrap().normalized();
        let out = rank(&q, &pool, 3).unwrap();
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(out.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(out[2].similarity, 0.0);
    }

    #[test]
    fn ties_keep_pool_order() {
        let pool: Vec<CorpusEntry> = ["x", "y", "z", "w"].iter().map(|id| entry(id, 2, &[(0, 1.0)])).collect();
        let q = TermVector::new(2, vec![(0, 1.0)]).unwrap();
        let out = rank(&q, &pool, 3).unwrap();
        let ids: Vec<&str> = out.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn length_is_min_of_k_and_pool() {
        let pool = vec![entry("a", 2, &[(0, 1.0)]), entry("b", 2, &[(1, 1.0)])];
        let q = TermVector::new(2, vec![(0, 1.0)]).unwrap();
        for k in 1..5 {
            assert_eq!(rank(&q, &pool, k).unwrap().len(), k.min(pool.len()));
        }
        let empty: Vec<CorpusEntry> = Vec::new();
        assert!(rank(&q, &empty, 3).unwrap().is_empty());
    }

    #[test]
    fn zero_k_is_invalid() {
        let pool = vec![entry("a", 2, &[(0, 1.0)])];
        let q = TermVector::new(2, vec![(0, 1.0)]).unwrap();
        assert!(matches!(rank(&q, &pool, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn mismatched_corpus_dimension_is_config_error() {
        let pool = vec![entry("a", 3, &[(0, 1.0)])];
        let q = TermVector::new(2, vec![(0, 1.0)]).unwrap();
        assert!(rank(&q, &pool, 1).unwrap_err().is_config_mismatch());
    }
}
