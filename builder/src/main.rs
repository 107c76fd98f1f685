mod fit;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use matcher::corpus::read_records;
use matcher::normalizer::normalize;
use matcher::persist::{load_artifacts, now_rfc3339, save_classifier, save_meta, save_vocabulary, ArtifactPaths, MetaFile, FORMAT_VERSION};
use matcher::{FitConfig, IdfScheme, TokenizerConfig};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::fit::{accuracy, fit, holdout_split, Example, FitOptions, ModelKind};

#[derive(Parser)]
#[command(name = "builder")]
#[command(about = "Fit vocabulary and role classifier artifacts from a labeled résumé dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit artifacts from a CSV file or a directory of CSV files
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output artifact directory
        #[arg(long)]
        output: String,
        #[arg(long, value_enum, default_value_t = ModelKind::Knn)]
        model: ModelKind,
        /// Neighbors consulted by the knn model
        #[arg(long, default_value_t = 5)]
        neighbors: usize,
        /// Drop terms found in fewer documents than this
        #[arg(long, default_value_t = 1)]
        min_df: usize,
        /// Drop terms found in more than this fraction of documents
        #[arg(long, default_value_t = 1.0)]
        max_df: f32,
        /// Longest n-gram to index
        #[arg(long, default_value_t = 1)]
        ngram_max: usize,
        /// Stem words with the English Snowball stemmer
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Keep English stop words
        #[arg(long, default_value_t = false)]
        keep_stop_words: bool,
        /// Use 1 + ln(tf) instead of raw term counts
        #[arg(long, default_value_t = false)]
        sublinear_tf: bool,
        /// Use idf = ln(N/df) + 1 instead of the smoothed ln((1+N)/(1+df)) + 1
        #[arg(long, default_value_t = false)]
        plain_idf: bool,
        /// Hold out every N-th row to report accuracy (0 disables)
        #[arg(long, default_value_t = 5)]
        holdout_every: usize,
    },
    /// Load an artifact directory and print its metadata and roles
    Inspect {
        #[arg(long)]
        artifacts: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            model,
            neighbors,
            min_df,
            max_df,
            ngram_max,
            stem,
            keep_stop_words,
            sublinear_tf,
            plain_idf,
            holdout_every,
        } => {
            let opts = FitOptions {
                tokenizer: TokenizerConfig { lowercase: true, stop_words: !keep_stop_words, stem, ngram_max },
                fit: FitConfig {
                    min_df,
                    max_df,
                    idf: if plain_idf { IdfScheme::Plain } else { IdfScheme::Smooth },
                    sublinear_tf,
                },
                model,
                neighbors,
            };
            build_artifacts(&input, &output, &opts, holdout_every)
        }
        Commands::Inspect { artifacts } => inspect(&artifacts),
    }
}

fn build_artifacts(input: &str, output: &str, opts: &FitOptions, holdout_every: usize) -> Result<()> {
    let examples = load_examples(Path::new(input))?;
    if examples.is_empty() {
        bail!("no labeled rows found under {input}");
    }
    tracing::info!(num_docs = examples.len(), "loaded training rows");

    let (train, test) = holdout_split(&examples, holdout_every);
    if !test.is_empty() && !train.is_empty() {
        let (vocab, artifact) = fit(&train, opts)?;
        let acc = accuracy(&vocab, &artifact, &test)?;
        tracing::info!(train = train.len(), test = test.len(), accuracy = acc, "holdout evaluation");
    }

    let (vocab, artifact) = fit(&examples, opts)?;
    let out_paths = ArtifactPaths::new(output);
    save_vocabulary(&out_paths, &vocab)?;
    save_classifier(&out_paths, &artifact)?;
    let meta = MetaFile {
        version: FORMAT_VERSION,
        created_at: now_rfc3339(),
        dimension: vocab.len(),
        num_classes: artifact.labels.len(),
        num_training_docs: examples.len(),
        model: opts.model.name().to_string(),
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output, "artifact build complete");
    Ok(())
}

fn load_examples(input_path: &Path) -> Result<Vec<Example>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("csv") {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path {} does not exist", input_path.display());
    }

    let mut examples = Vec::new();
    for file in files {
        let records = read_records(File::open(&file)?)?;
        tracing::debug!(file = %file.display(), rows = records.len(), "read dataset file");
        examples.extend(records.into_iter().map(|r| Example { text: normalize(&r.text), category: r.category.trim().to_string() }));
    }
    Ok(examples)
}

fn inspect(artifacts: &str) -> Result<()> {
    let (_vocab, classifier, meta) = load_artifacts(&ArtifactPaths::new(artifacts))?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    for role in classifier.labels().roles() {
        println!("{role}");
    }
    Ok(())
}
