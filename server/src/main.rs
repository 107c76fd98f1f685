use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::questions::{DisabledGenerator, HttpQuestionGenerator, QuestionGenerator, Questions, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Artifact directory written by the builder
    #[arg(long, default_value = "./artifacts")]
    artifacts: PathBuf,
    /// Candidate pool CSV (identifier, text, category)
    #[arg(long, default_value = "./final_dataset.csv")]
    corpus: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn question_generator() -> Result<Arc<dyn QuestionGenerator>> {
    let Ok(api_key) = std::env::var("QUESTIONS_API_KEY") else {
        tracing::warn!("QUESTIONS_API_KEY not set, interview questions disabled");
        return Ok(Arc::new(DisabledGenerator));
    };
    let endpoint = std::env::var("QUESTIONS_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    let model = std::env::var("QUESTIONS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let timeout_secs = std::env::var("QUESTIONS_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30);
    Ok(Arc::new(HttpQuestionGenerator::new(endpoint, api_key, model, Duration::from_secs(timeout_secs))?))
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = ServerConfig {
        artifacts_dir: args.artifacts,
        corpus_path: args.corpus,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
        cors_allow_origin: std::env::var("CORS_ALLOW_ORIGIN").ok(),
        questions: Questions::new(question_generator()?),
    };
    let app: Router = build_app(config)?.layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
