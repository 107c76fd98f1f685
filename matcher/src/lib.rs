//! Text matching and ranking engine: normalize, vectorize, classify a
//! document into a role, and rank a candidate pool against it.

pub mod classifier;
pub mod corpus;
pub mod error;
pub mod normalizer;
pub mod persist;
pub mod pipeline;
pub mod ranker;
pub mod tokenizer;
pub mod vector;
pub mod vocabulary;

pub use classifier::{ClassId, Classify, LabelTable, LinearModel, ModelParams, NearestNeighbors, RoleClassifier};
pub use corpus::{CandidatePool, CorpusEntry, Document};
pub use error::{Error, Mismatch, Result};
pub use pipeline::{JobMatch, Pipeline, SharedPipeline};
pub use ranker::{cosine_similarity, rank, MatchResult};
pub use tokenizer::TokenizerConfig;
pub use vector::{TermId, TermVector};
pub use vocabulary::{FitConfig, IdfScheme, Vectorize, Vocabulary};

/// Human-readable role name produced by the classifier.
pub type RoleLabel = String;
