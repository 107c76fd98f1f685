//! Role classification over term vectors.
//!
//! The pipeline only sees the [`Classify`] capability: a vector goes in, a raw
//! class id comes out. [`RoleClassifier`] pairs a model with its
//! [`LabelTable`] and refuses to exist unless the table covers every class the
//! model can emit.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Error, Mismatch, Result};
use crate::ranker::cosine_similarity;
use crate::vector::TermVector;
use crate::RoleLabel;

pub type ClassId = u32;

/// Vector-in, class-out capability.
pub trait Classify: Send + Sync {
    fn predict(&self, vector: &TermVector) -> Result<ClassId>;
    /// Every class id `predict` can return.
    fn class_ids(&self) -> BTreeSet<ClassId>;
    fn dimension(&self) -> usize;
}

fn check_dimension(expected: usize, vector: &TermVector) -> Result<()> {
    if vector.dim() != expected {
        return Err(Mismatch::Dimension { what: "query vector", expected, found: vector.dim() }.into());
    }
    Ok(())
}

/// One weight row and intercept per class; predicts the argmax of `w·x + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    dim: usize,
    classes: Vec<ClassId>,
    weights: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
}

impl LinearModel {
    pub fn new(dim: usize, classes: Vec<ClassId>, weights: Vec<Vec<f32>>, intercepts: Vec<f32>) -> Result<Self> {
        let model = Self { dim, classes, weights, intercepts };
        model.validate()?;
        Ok(model)
    }

    /// Shape checks shared by `new` and artifact loading.
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Mismatch::EmptyModel.into());
        }
        if self.weights.len() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(Error::InvalidArgument(format!(
                "{} classes but {} weight rows and {} intercepts",
                self.classes.len(),
                self.weights.len(),
                self.intercepts.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != self.dim) {
            return Err(Mismatch::Dimension { what: "weight row", expected: self.dim, found: row.len() }.into());
        }
        let unique: BTreeSet<_> = self.classes.iter().collect();
        if unique.len() != self.classes.len() {
            return Err(Error::InvalidArgument("duplicate class ids in linear model".into()));
        }
        Ok(())
    }

    /// Fit one unit-length centroid per class from labeled vectors.
    pub fn nearest_centroid(dim: usize, examples: &[(ClassId, &TermVector)]) -> Result<Self> {
        let mut sums: BTreeMap<ClassId, (Vec<f32>, usize)> = BTreeMap::new();
        for (class, vector) in examples {
            if vector.dim() != dim {
                return Err(Mismatch::Dimension { what: "training vector", expected: dim, found: vector.dim() }.into());
            }
            let (row, count) = sums.entry(*class).or_insert_with(|| (vec![0.0; dim], 0));
            for (tid, w) in vector.iter() {
                row[tid as usize] += w;
            }
            *count += 1;
        }

        let mut classes = Vec::with_capacity(sums.len());
        let mut weights = Vec::with_capacity(sums.len());
        for (class, (mut row, count)) in sums {
            for w in row.iter_mut() { *w /= count as f32; }
            let norm = row.iter().map(|w| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for w in row.iter_mut() { *w /= norm; }
            }
            classes.push(class);
            weights.push(row);
        }
        let intercepts = vec![0.0; classes.len()];
        Self::new(dim, classes, weights, intercepts)
    }
}

impl Classify for LinearModel {
    fn predict(&self, vector: &TermVector) -> Result<ClassId> {
        check_dimension(self.dim, vector)?;
        let mut best: Option<(ClassId, f32)> = None;
        for ((class, row), b) in self.classes.iter().zip(&self.weights).zip(&self.intercepts) {
            let score = vector.dot_dense(row) + b;
            best = match best {
                Some((c, s)) if s > score || (s == score && c < *class) => Some((c, s)),
                _ => Some((*class, score)),
            };
        }
        best.map(|(c, _)| c).ok_or_else(|| Mismatch::EmptyModel.into())
    }

    fn class_ids(&self) -> BTreeSet<ClassId> { self.classes.iter().copied().collect() }

    fn dimension(&self) -> usize { self.dim }
}

/// Majority vote among the `k` reference vectors most similar to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestNeighbors {
    dim: usize,
    k: usize,
    references: Vec<(ClassId, TermVector)>,
}

impl NearestNeighbors {
    pub fn new(dim: usize, k: usize, references: Vec<(ClassId, TermVector)>) -> Result<Self> {
        let model = Self { dim, k, references };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::InvalidArgument("neighbor count must be positive".into()));
        }
        if self.references.is_empty() {
            return Err(Mismatch::EmptyModel.into());
        }
        if let Some((_, v)) = self.references.iter().find(|(_, v)| v.dim() != self.dim) {
            return Err(Mismatch::Dimension { what: "reference vector", expected: self.dim, found: v.dim() }.into());
        }
        Ok(())
    }

    pub fn k(&self) -> usize { self.k }
}

impl Classify for NearestNeighbors {
    fn predict(&self, vector: &TermVector) -> Result<ClassId> {
        check_dimension(self.dim, vector)?;
        let mut scored: Vec<(ClassId, f32)> = self
            .references
            .iter()
            .map(|(class, reference)| (*class, cosine_similarity(vector, reference)))
            .collect();
        // stable: equally similar references keep their stored order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut votes: BTreeMap<ClassId, usize> = BTreeMap::new();
        for (class, _) in scored.into_iter().take(self.k) {
            *votes.entry(class).or_insert(0) += 1;
        }
        // BTreeMap iterates ascending, so the first maximum is the lowest id
        let mut winner: Option<(ClassId, usize)> = None;
        for (class, count) in votes {
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((class, count));
            }
        }
        winner.map(|(c, _)| c).ok_or_else(|| Mismatch::EmptyModel.into())
    }

    fn class_ids(&self) -> BTreeSet<ClassId> { self.references.iter().map(|(c, _)| *c).collect() }

    fn dimension(&self) -> usize { self.dim }
}

/// Serializable choice of concrete model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelParams {
    Linear(LinearModel),
    Neighbors(NearestNeighbors),
}

impl ModelParams {
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelParams::Linear(m) => m.validate(),
            ModelParams::Neighbors(m) => m.validate(),
        }
    }
}

impl Classify for ModelParams {
    fn predict(&self, vector: &TermVector) -> Result<ClassId> {
        match self {
            ModelParams::Linear(m) => m.predict(vector),
            ModelParams::Neighbors(m) => m.predict(vector),
        }
    }

    fn class_ids(&self) -> BTreeSet<ClassId> {
        match self {
            ModelParams::Linear(m) => m.class_ids(),
            ModelParams::Neighbors(m) => m.class_ids(),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            ModelParams::Linear(m) => m.dimension(),
            ModelParams::Neighbors(m) => m.dimension(),
        }
    }
}

/// Explicit class id → role name mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable(BTreeMap<ClassId, String>);

impl LabelTable {
    pub fn new(entries: impl IntoIterator<Item = (ClassId, String)>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (id, name) in entries {
            if map.insert(id, name).is_some() {
                return Err(Error::InvalidArgument(format!("class id {id} appears twice in label table")));
            }
        }
        Ok(Self(map))
    }

    /// Assign ids to distinct role names in sorted order.
    pub fn enumerate<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = names.into_iter().collect();
        Self(distinct.into_iter().enumerate().map(|(i, n)| (i as ClassId, n.to_string())).collect())
    }

    pub fn resolve(&self, id: ClassId) -> Result<&str> {
        self.0.get(&id).map(String::as_str).ok_or_else(|| Mismatch::UnknownClass(id).into())
    }

    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.0.iter().find(|(_, n)| n.as_str() == name).map(|(id, _)| *id)
    }

    /// Fail unless every id in `ids` has an entry.
    pub fn ensure_covers(&self, ids: &BTreeSet<ClassId>) -> Result<()> {
        let missing: Vec<ClassId> = ids.iter().filter(|id| !self.0.contains_key(id)).copied().collect();
        if !missing.is_empty() {
            return Err(Mismatch::IncompleteLabels(missing).into());
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn roles(&self) -> impl Iterator<Item = &str> { self.0.values().map(String::as_str) }
}

/// On-disk form of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub model: ModelParams,
    pub labels: LabelTable,
}

impl ClassifierArtifact {
    /// Deserialized models skip their constructors, so shapes are rechecked here.
    pub fn into_classifier(self) -> Result<RoleClassifier> {
        self.model.validate()?;
        RoleClassifier::new(Box::new(self.model), self.labels)
    }
}

/// A model bound to a label table that covers it.
pub struct RoleClassifier {
    model: Box<dyn Classify>,
    labels: LabelTable,
}

impl RoleClassifier {
    pub fn new(model: Box<dyn Classify>, labels: LabelTable) -> Result<Self> {
        let ids = model.class_ids();
        if ids.is_empty() {
            return Err(Mismatch::EmptyModel.into());
        }
        labels.ensure_covers(&ids)?;
        Ok(Self { model, labels })
    }

    pub fn classify(&self, vector: &TermVector) -> Result<RoleLabel> {
        let id = self.model.predict(vector)?;
        let role = self.labels.resolve(id)?;
        tracing::debug!(class_id = id, role, "classified vector");
        Ok(role.to_string())
    }

    pub fn dimension(&self) -> usize { self.model.dimension() }

    pub fn labels(&self) -> &LabelTable { &self.labels }
}

impl fmt::Debug for RoleClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleClassifier")
            .field("dimension", &self.model.dimension())
            .field("labels", &self.labels)
            .finish()
    }
}
