use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::tokenizer::{tokenize, TokenizerConfig};
use crate::vector::{TermId, TermVector};

/// Text-in, vector-out capability the pipeline depends on.
pub trait Vectorize: Send + Sync {
    /// Vectorize already-normalized text.
    fn vectorize(&self, text: &str) -> TermVector;
    fn dimension(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdfScheme {
    /// ln((1 + n) / (1 + df)) + 1
    Smooth,
    /// ln(n / df) + 1
    Plain,
}

/// Build-time settings. None of these affect inference.
#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    /// Minimum number of documents a term must occur in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may occur in.
    pub max_df: f32,
    pub idf: IdfScheme,
    /// Use 1 + ln(tf) instead of raw counts.
    pub sublinear_tf: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self { min_df: 1, max_df: 1.0, idf: IdfScheme::Smooth, sublinear_tf: false }
    }
}

/// Fixed term → index mapping with one idf weight per index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: HashMap<String, TermId>,
    idf: Vec<f32>,
    tokenizer: TokenizerConfig,
    sublinear_tf: bool,
}

impl Vocabulary {
    pub fn from_parts(
        terms: HashMap<String, TermId>,
        idf: Vec<f32>,
        tokenizer: TokenizerConfig,
        sublinear_tf: bool,
    ) -> Result<Self> {
        let vocab = Self { terms, idf, tokenizer, sublinear_tf };
        vocab.validate()?;
        Ok(vocab)
    }

    /// Check that indices are unique, dense and that every idf is usable.
    pub fn validate(&self) -> Result<()> {
        if self.terms.len() != self.idf.len() {
            return Err(Error::InvalidArgument(format!(
                "vocabulary has {} terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.terms.len());
        for (term, &tid) in &self.terms {
            if tid as usize >= self.idf.len() || !seen.insert(tid) {
                return Err(Error::InvalidArgument(format!("term '{term}' has invalid or duplicate index {tid}")));
            }
        }
        if let Some(w) = self.idf.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidArgument(format!("idf weight {w} is not a finite non-negative number")));
        }
        Ok(())
    }

    /// Fit a vocabulary over normalized documents.
    ///
    /// Terms are indexed in lexicographic order so refitting the same corpus
    /// yields the same artifact.
    pub fn fit<S: AsRef<str>>(docs: &[S], tokenizer: TokenizerConfig, fit: &FitConfig) -> Result<Self> {
        if fit.min_df == 0 {
            return Err(Error::InvalidArgument("min_df must be at least 1".into()));
        }
        if !(fit.max_df > 0.0 && fit.max_df <= 1.0) {
            return Err(Error::InvalidArgument(format!("max_df must be in (0, 1], got {}", fit.max_df)));
        }
        if docs.is_empty() {
            return Err(Error::InvalidArgument("cannot fit a vocabulary on zero documents".into()));
        }

        let n = docs.len();
        let mut df: BTreeMap<String, usize> = BTreeMap::new();
        for doc in docs {
            let unique: HashSet<String> = tokenize(doc.as_ref(), &tokenizer).into_iter().collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let mut terms = HashMap::new();
        let mut idf = Vec::new();
        for (term, count) in df {
            // ratio in f32, the precision max_df was given in
            if count < fit.min_df || count as f32 / n as f32 > fit.max_df { continue; }
            let tid = idf.len() as TermId;
            let (n_f, df_f) = (n as f32, count as f32);
            let weight = match fit.idf {
                IdfScheme::Smooth => ((1.0 + n_f) / (1.0 + df_f)).ln() + 1.0,
                IdfScheme::Plain => (n_f / df_f).ln() + 1.0,
            };
            terms.insert(term, tid);
            idf.push(weight);
        }
        tracing::info!(num_docs = n, num_terms = idf.len(), "fitted vocabulary");
        Self::from_parts(terms, idf, tokenizer, fit.sublinear_tf)
    }

    pub fn len(&self) -> usize { self.idf.len() }

    pub fn is_empty(&self) -> bool { self.idf.is_empty() }

    pub fn index_of(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }

    pub fn idf(&self, tid: TermId) -> Option<f32> { self.idf.get(tid as usize).copied() }

    pub fn tokenizer(&self) -> &TokenizerConfig { &self.tokenizer }
}

impl Vectorize for Vocabulary {
    fn vectorize(&self, text: &str) -> TermVector {
        let mut tf: HashMap<TermId, u32> = HashMap::new();
        for term in tokenize(text, &self.tokenizer) {
            if let Some(tid) = self.index_of(&term) {
                *tf.entry(tid).or_insert(0) += 1;
            }
        }
        let weights = tf.into_iter().map(|(tid, count)| {
            let tf = if self.sublinear_tf { 1.0 + (count as f32).ln() } else { count as f32 };
            (tid, tf * self.idf[tid as usize])
        });
        // ids come from the dictionary and idf is validated, so construction cannot fail
        TermVector::new(self.len(), weights)
            .unwrap_or_else(|_| TermVector::zero(self.len()))
            .normalized()
    }

    fn dimension(&self) -> usize { self.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(docs: &[&str]) -> Vocabulary {
        Vocabulary::fit(docs, TokenizerConfig::default(), &FitConfig::default()).unwrap()
    }

    #[test]
    fn fit_orders_terms_lexicographically() {
        let v = fitted(&["python sql", "java sql"]);
        assert_eq!(v.len(), 3);
        assert_eq!(v.index_of("java"), Some(0));
        assert_eq!(v.index_of("python"), Some(1));
        assert_eq!(v.index_of("sql"), Some(2));
    }

    #[test]
    fn smooth_idf_values() {
        let v = fitted(&["python sql", "java sql"]);
        let sql = v.idf(v.index_of("sql").unwrap()).unwrap();
        let java = v.idf(v.index_of("java").unwrap()).unwrap();
        assert!((sql - 1.0).abs() < 1e-6);
        assert!((java - ((3.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn document_frequency_thresholds() {
        let docs = ["rust sql", "rust java", "rust go"];
        let fit = FitConfig { min_df: 1, max_df: 0.9, ..FitConfig::default() };
        let v = Vocabulary::fit(&docs, TokenizerConfig::default(), &fit).unwrap();
        assert!(v.index_of("rust").is_none());
        let fit = FitConfig { min_df: 2, ..FitConfig::default() };
        let v = Vocabulary::fit(&docs, TokenizerConfig::default(), &fit).unwrap();
        assert_eq!(v.len(), 1);
        assert!(v.index_of("rust").is_some());
    }

    #[test]
    fn max_df_boundary_is_inclusive() {
        let mut docs = vec!["rust sql"; 9];
        docs.push("java go");
        let fit = FitConfig { max_df: 0.9, ..FitConfig::default() };
        let v = Vocabulary::fit(&docs, TokenizerConfig::default(), &fit).unwrap();
        assert!(v.index_of("rust").is_some());
        assert!(v.index_of("sql").is_some());

        let fit = FitConfig { max_df: 0.8, ..FitConfig::default() };
        let v = Vocabulary::fit(&docs, TokenizerConfig::default(), &fit).unwrap();
        assert!(v.index_of("rust").is_none());
        assert!(v.index_of("java").is_some());
    }

    #[test]
    fn fit_rejects_bad_config() {
        let bad = FitConfig { max_df: 0.0, ..FitConfig::default() };
        assert!(Vocabulary::fit(&["a b"], TokenizerConfig::default(), &bad).is_err());
        let bad = FitConfig { min_df: 0, ..FitConfig::default() };
        assert!(Vocabulary::fit(&["a b"], TokenizerConfig::default(), &bad).is_err());
        let empty: [&str; 0] = [];
        assert!(Vocabulary::fit(&empty, TokenizerConfig::default(), &FitConfig::default()).is_err());
    }

    #[test]
    fn vectorize_is_unit_length_and_ignores_unknown_terms() {
        let v = fitted(&["python developer sql", "java developer spring"]);
        let vec = v.vectorize("python python kubernetes");
        assert_eq!(vec.dim(), v.len());
        assert_eq!(vec.nnz(), 1);
        assert!((vec.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_vocabulary_text_is_zero_vector() {
        let v = fitted(&["python developer sql"]);
        assert!(v.vectorize("haskell erlang").is_zero());
        assert!(v.vectorize("").is_zero());
    }

    #[test]
    fn vectorize_is_deterministic() {
        let v = fitted(&["python developer sql", "java developer spring", "sql spring"]);
        let text = "sql developer spring sql python";
        let a = v.vectorize(text);
        for _ in 0..10 {
            let b = v.vectorize(text);
            assert_eq!(a, b);
            let bits_a: Vec<u32> = a.iter().map(|(_, w)| w.to_bits()).collect();
            let bits_b: Vec<u32> = b.iter().map(|(_, w)| w.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn from_parts_rejects_duplicate_indices() {
        let mut terms = HashMap::new();
        terms.insert("a".to_string(), 0);
        terms.insert("b".to_string(), 0);
        let res = Vocabulary::from_parts(terms, vec![1.0, 1.0], TokenizerConfig::default(), false);
        assert!(res.is_err());
    }

    #[test]
    fn sublinear_tf_dampens_repeats() {
        let docs = ["python sql", "java sql"];
        let fit = FitConfig { sublinear_tf: true, ..FitConfig::default() };
        let sub = Vocabulary::fit(&docs, TokenizerConfig::default(), &fit).unwrap();
        let raw = fitted(&docs);
        let text = "python python python python sql";
        let py = raw.index_of("python").unwrap();
        assert!(sub.vectorize(text).get(py) < raw.vectorize(text).get(py));
    }
}
