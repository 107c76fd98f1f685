use thiserror::Error;

use crate::classifier::ClassId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Artifacts disagree with each other. Fatal, never retried.
    #[error("configuration mismatch: {0}")]
    ConfigMismatch(Mismatch),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The predicted role has no members in the candidate pool.
    #[error("no candidates for role '{role}'")]
    NoCandidates { role: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("class id {0} has no entry in the label decoding table")]
    UnknownClass(ClassId),

    #[error("{what} has dimension {found}, expected {expected}")]
    Dimension { what: &'static str, expected: usize, found: usize },

    #[error("label decoding table is missing class ids {0:?}")]
    IncompleteLabels(Vec<ClassId>),

    #[error("classifier model has no classes")]
    EmptyModel,

    #[error("artifact format version {found} is not supported (expected {expected})")]
    FormatVersion { expected: u32, found: u32 },
}

impl Error {
    pub fn is_config_mismatch(&self) -> bool {
        matches!(self, Error::ConfigMismatch(_))
    }
}

impl From<Mismatch> for Error {
    fn from(m: Mismatch) -> Self {
        Error::ConfigMismatch(m)
    }
}
