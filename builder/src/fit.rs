use anyhow::{bail, Result};
use clap::ValueEnum;
use matcher::classifier::ClassifierArtifact;
use matcher::{FitConfig, LabelTable, LinearModel, ModelParams, NearestNeighbors, TokenizerConfig, Vectorize, Vocabulary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    /// k nearest reference résumés, majority vote
    Knn,
    /// one unit-length centroid per role
    Centroid,
}

impl ModelKind {
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Knn => "knn",
            ModelKind::Centroid => "centroid",
        }
    }
}

/// A normalized training document with its role.
#[derive(Debug, Clone)]
pub struct Example {
    pub text: String,
    pub category: String,
}

pub struct FitOptions {
    pub tokenizer: TokenizerConfig,
    pub fit: FitConfig,
    pub model: ModelKind,
    pub neighbors: usize,
}

pub fn fit(examples: &[Example], opts: &FitOptions) -> Result<(Vocabulary, ClassifierArtifact)> {
    if examples.is_empty() {
        bail!("no training examples");
    }
    let texts: Vec<&str> = examples.iter().map(|e| e.text.as_str()).collect();
    let vocab = Vocabulary::fit(&texts, opts.tokenizer.clone(), &opts.fit)?;
    let labels = LabelTable::enumerate(examples.iter().map(|e| e.category.as_str()));

    let mut labeled = Vec::with_capacity(examples.len());
    for e in examples {
        let Some(id) = labels.id_of(&e.category) else {
            bail!("category '{}' missing from label table", e.category);
        };
        labeled.push((id, vocab.vectorize(&e.text)));
    }

    let model = match opts.model {
        ModelKind::Knn => ModelParams::Neighbors(NearestNeighbors::new(vocab.len(), opts.neighbors, labeled)?),
        ModelKind::Centroid => {
            let refs: Vec<_> = labeled.iter().map(|(id, v)| (*id, v)).collect();
            ModelParams::Linear(LinearModel::nearest_centroid(vocab.len(), &refs)?)
        }
    };
    tracing::info!(num_docs = examples.len(), num_terms = vocab.len(), num_classes = labels.len(), model = opts.model.name(), "fitted model");
    Ok((vocab, ClassifierArtifact { model, labels }))
}

/// Split off every `every`-th example (1-based) as holdout. `every == 0`
/// keeps everything for training.
pub fn holdout_split(examples: &[Example], every: usize) -> (Vec<Example>, Vec<Example>) {
    if every == 0 {
        return (examples.to_vec(), Vec::new());
    }
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (i, e) in examples.iter().enumerate() {
        if (i + 1) % every == 0 { test.push(e.clone()) } else { train.push(e.clone()) }
    }
    (train, test)
}

/// Fraction of `test` examples whose predicted role equals the recorded one.
pub fn accuracy(vocab: &Vocabulary, artifact: &ClassifierArtifact, test: &[Example]) -> Result<f64> {
    if test.is_empty() {
        return Ok(0.0);
    }
    let classifier = artifact.clone().into_classifier()?;
    let mut correct = 0usize;
    for e in test {
        if classifier.classify(&vocab.vectorize(&e.text))? == e.category {
            correct += 1;
        }
    }
    Ok(correct as f64 / test.len() as f64)
}
