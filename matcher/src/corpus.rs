use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Mismatch, Result};
use crate::normalizer::normalize;
use crate::vector::TermVector;
use crate::vocabulary::Vectorize;

/// A document after normalization and vectorization. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    raw: String,
    normalized: String,
    vector: TermVector,
}

impl Document {
    pub fn new(raw: impl Into<String>, vectorizer: &dyn Vectorize) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        let vector = vectorizer.vectorize(&normalized);
        Self { raw, normalized, vector }
    }

    pub fn from_parts(raw: String, normalized: String, vector: TermVector) -> Self {
        Self { raw, normalized, vector }
    }

    pub fn raw(&self) -> &str { &self.raw }

    pub fn normalized(&self) -> &str { &self.normalized }

    pub fn vector(&self) -> &TermVector { &self.vector }
}

/// A labeled member of the candidate pool.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    pub id: String,
    pub category: String,
    pub document: Document,
}

impl CorpusEntry {
    pub fn vector(&self) -> &TermVector { self.document.vector() }

    pub fn text(&self) -> &str { self.document.raw() }
}

/// Row of the tabular candidate source.
#[derive(Debug, Deserialize)]
pub struct CorpusRecord {
    #[serde(alias = "id", alias = "S.No", default)]
    pub identifier: Option<String>,
    #[serde(alias = "Resume")]
    pub text: String,
    #[serde(alias = "Category")]
    pub category: String,
}

/// Read candidate rows from CSV, skipping rows without text or category.
/// Missing identifiers fall back to `row-N` with the 1-based row number.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<CorpusRecord>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (row, result) in rdr.deserialize::<CorpusRecord>().enumerate() {
        let mut record = result?;
        if record.text.trim().is_empty() || record.category.trim().is_empty() {
            skipped += 1;
            continue;
        }
        if record.identifier.as_deref().map_or(true, |id| id.trim().is_empty()) {
            record.identifier = Some(format!("row-{}", row + 1));
        }
        records.push(record);
    }
    if skipped > 0 {
        tracing::warn!(skipped, "skipped candidate rows without text or category");
    }
    Ok(records)
}

/// Immutable, pre-vectorized candidate pool.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    entries: Vec<CorpusEntry>,
}

impl CandidatePool {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    /// Fails if two records share an identifier.
    pub fn from_records(records: Vec<CorpusRecord>, vectorizer: &dyn Vectorize) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for r in &records {
            let id = r.identifier.as_deref().unwrap_or_default();
            if !seen.insert(id) {
                return Err(Error::InvalidArgument(format!("duplicate candidate identifier '{id}'")));
            }
        }
        let entries = records
            .into_iter()
            .map(|r| CorpusEntry {
                id: r.identifier.unwrap_or_default(),
                category: r.category.trim().to_string(),
                document: Document::new(r.text, vectorizer),
            })
            .collect::<Vec<_>>();
        tracing::info!(num_docs = entries.len(), "vectorized candidate pool");
        Ok(Self { entries })
    }

    pub fn from_reader<R: Read>(reader: R, vectorizer: &dyn Vectorize) -> Result<Self> {
        Self::from_records(read_records(reader)?, vectorizer)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P, vectorizer: &dyn Vectorize) -> Result<Self> {
        let f = File::open(path)?;
        Self::from_reader(f, vectorizer)
    }

    /// Entries whose category equals `role`, ignoring case, in pool order.
    pub fn filter_by_role(&self, role: &str) -> Vec<&CorpusEntry> {
        let wanted = role.to_lowercase();
        self.entries.iter().filter(|e| e.category.to_lowercase() == wanted).collect()
    }

    /// Fail if any entry was vectorized against a different dimension.
    pub fn ensure_dimension(&self, dim: usize) -> Result<()> {
        if let Some(e) = self.entries.iter().find(|e| e.vector().dim() != dim) {
            return Err(Mismatch::Dimension { what: "corpus vector", expected: dim, found: e.vector().dim() }.into());
        }
        Ok(())
    }

    pub fn entries(&self) -> &[CorpusEntry] { &self.entries }

    pub fn get(&self, id: &str) -> Option<&CorpusEntry> { self.entries.iter().find(|e| e.id == id) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
