use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::classifier::RoleClassifier;
use crate::corpus::CandidatePool;
use crate::error::{Error, Mismatch, Result};
use crate::normalizer::normalize;
use crate::persist::{load_artifacts, ArtifactPaths};
use crate::ranker::{rank, MatchResult};
use crate::vector::TermVector;
use crate::vocabulary::Vectorize;
use crate::RoleLabel;

/// Outcome of matching a job description against the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatch {
    pub role: RoleLabel,
    /// Number of pool entries carrying the predicted role.
    pub pool_size: usize,
    pub results: Vec<MatchResult>,
}

/// normalize → vectorize → classify → filter → rank.
///
/// Holds only artifacts that are read-only after construction, so a single
/// instance can serve any number of concurrent requests.
pub struct Pipeline {
    vectorizer: Box<dyn Vectorize>,
    classifier: RoleClassifier,
    pool: CandidatePool,
}

impl Pipeline {
    pub fn new(vectorizer: Box<dyn Vectorize>, classifier: RoleClassifier, pool: CandidatePool) -> Result<Self> {
        let dim = vectorizer.dimension();
        if classifier.dimension() != dim {
            return Err(Mismatch::Dimension { what: "classifier", expected: dim, found: classifier.dimension() }.into());
        }
        pool.ensure_dimension(dim)?;

        let roles: Vec<String> = classifier.labels().roles().map(str::to_lowercase).collect();
        for entry in pool.entries() {
            if !roles.contains(&entry.category.to_lowercase()) {
                tracing::warn!(id = %entry.id, category = %entry.category, "candidate category is never predicted by the classifier");
            }
        }
        Ok(Self { vectorizer, classifier, pool })
    }

    /// Load the artifact directory and vectorize the candidate CSV against it.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(artifacts: P, corpus_csv: Q) -> Result<Self> {
        let paths = ArtifactPaths::new(artifacts);
        let (vocab, classifier, _meta) = load_artifacts(&paths)?;
        let pool = CandidatePool::from_csv_path(corpus_csv, &vocab)?;
        Self::new(Box::new(vocab), classifier, pool)
    }

    pub fn vectorize(&self, raw_text: &str) -> TermVector {
        self.vectorizer.vectorize(&normalize(raw_text))
    }

    /// Predict the role of a single document.
    pub fn classify_document(&self, raw_text: &str) -> Result<RoleLabel> {
        self.classifier.classify(&self.vectorize(raw_text))
    }

    /// Predict the role of a job description and rank the candidates that
    /// share it. An empty filtered pool is reported as [`Error::NoCandidates`].
    pub fn match_job_description(&self, raw_text: &str, k: usize) -> Result<JobMatch> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be positive".into()));
        }
        let query = self.vectorize(raw_text);
        let role = self.classifier.classify(&query)?;
        let candidates = self.pool.filter_by_role(&role);
        if candidates.is_empty() {
            return Err(Error::NoCandidates { role });
        }
        let pool_size = candidates.len();
        let results = rank(&query, candidates, k)?;
        tracing::debug!(%role, pool_size, k, returned = results.len(), "matched job description");
        Ok(JobMatch { role, pool_size, results })
    }

    pub fn pool(&self) -> &CandidatePool { &self.pool }

    pub fn classifier(&self) -> &RoleClassifier { &self.classifier }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("dimension", &self.vectorizer.dimension())
            .field("classifier", &self.classifier)
            .field("pool_size", &self.pool.len())
            .finish()
    }
}

/// Process-wide handle to the current pipeline.
///
/// Readers take a cheap `Arc` clone and never hold the lock while computing.
/// A reload builds the replacement completely before `publish` swaps it in.
pub struct SharedPipeline {
    current: RwLock<Arc<Pipeline>>,
}

impl SharedPipeline {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { current: RwLock::new(Arc::new(pipeline)) }
    }

    pub fn current(&self) -> Arc<Pipeline> {
        self.current.read().clone()
    }

    /// Swap in a new pipeline, returning the previous one.
    pub fn publish(&self, pipeline: Pipeline) -> Arc<Pipeline> {
        let next = Arc::new(pipeline);
        std::mem::replace(&mut *self.current.write(), next)
    }
}
