use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::classifier::{ClassifierArtifact, RoleClassifier};
use crate::error::{Mismatch, Result};
use crate::vocabulary::{Vectorize, Vocabulary};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub dimension: usize,
    pub num_classes: usize,
    pub num_training_docs: usize,
    pub model: String,
}

pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    fn classifier(&self) -> PathBuf { self.root.join("classifier.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_vocabulary(paths: &ArtifactPaths, vocab: &Vocabulary) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_file(&paths.vocabulary(), &to_bytes(vocab)?)
}

pub fn load_vocabulary(paths: &ArtifactPaths) -> Result<Vocabulary> {
    let vocab: Vocabulary = from_bytes(&read_file(&paths.vocabulary())?)?;
    vocab.validate()?;
    Ok(vocab)
}

pub fn save_classifier(paths: &ArtifactPaths, artifact: &ClassifierArtifact) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_file(&paths.classifier(), &to_bytes(artifact)?)
}

pub fn load_classifier(paths: &ArtifactPaths) -> Result<ClassifierArtifact> {
    from_bytes(&read_file(&paths.classifier())?)
}

pub fn save_meta(paths: &ArtifactPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_file(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &ArtifactPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Load vocabulary and classifier and check that they agree with each other
/// and with `meta.json`.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<(Vocabulary, RoleClassifier, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(Mismatch::FormatVersion { expected: FORMAT_VERSION, found: meta.version }.into());
    }
    let vocab = load_vocabulary(paths)?;
    let classifier = load_classifier(paths)?.into_classifier()?;
    if vocab.dimension() != meta.dimension {
        return Err(Mismatch::Dimension { what: "vocabulary", expected: meta.dimension, found: vocab.dimension() }.into());
    }
    if classifier.dimension() != vocab.dimension() {
        return Err(Mismatch::Dimension { what: "classifier", expected: vocab.dimension(), found: classifier.dimension() }.into());
    }
    tracing::info!(
        root = %paths.root.display(),
        num_terms = vocab.len(),
        num_classes = classifier.labels().len(),
        model = %meta.model,
        "loaded artifacts"
    );
    Ok((vocab, classifier, meta))
}
