pub mod questions;

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use matcher::{Error as MatchError, JobMatch, Pipeline, SharedPipeline};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::questions::Questions;

/// Upper bound on questions requested per document.
const MAX_QUESTIONS: usize = 10;

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
    #[serde(default)]
    pub questions: usize,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    pub role: String,
    pub questions: Vec<String>,
}

#[derive(Deserialize)]
pub struct MatchRequest {
    pub text: String,
    /// Signed so negative values reach the 400 path instead of failing extraction.
    #[serde(default = "default_k")]
    pub k: i64,
    #[serde(default)]
    pub questions_per_candidate: usize,
}
fn default_k() -> i64 { 3 }

#[derive(Serialize)]
pub struct MatchResponse {
    pub role: String,
    pub pool_size: usize,
    pub results: Vec<CandidateHit>,
}

#[derive(Serialize)]
pub struct CandidateHit {
    pub rank: usize,
    pub id: String,
    pub category: String,
    pub similarity: f32,
    pub questions: Vec<String>,
}

pub struct ServerConfig {
    pub artifacts_dir: PathBuf,
    pub corpus_path: PathBuf,
    pub admin_token: Option<String>,
    /// Comma-separated origins; `None` or empty allows any origin.
    pub cors_allow_origin: Option<String>,
    pub questions: Questions,
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SharedPipeline>,
    pub artifacts_dir: PathBuf,
    pub corpus_path: PathBuf,
    pub questions: Questions,
    pub admin_token: Option<String>,
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    // Load artifacts and candidate pool at startup
    let pipeline = Pipeline::load(&config.artifacts_dir, &config.corpus_path)?;
    tracing::info!(pool_size = pipeline.pool().len(), "pipeline ready");
    let app_state = AppState {
        pipeline: Arc::new(SharedPipeline::new(pipeline)),
        artifacts_dir: config.artifacts_dir,
        corpus_path: config.corpus_path,
        questions: config.questions,
        admin_token: config.admin_token,
    };

    let origins: Vec<_> = config
        .cors_allow_origin
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/classify", post(classify_handler))
        .route("/match", post(match_handler))
        .route("/match/export", post(export_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors);
    Ok(app)
}

fn error_response(err: MatchError) -> (StatusCode, String) {
    let status = match &err {
        MatchError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        MatchError::NoCandidates { .. } => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!(error = %err, "pipeline failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

/// Run CPU-bound pipeline work off the async worker threads.
async fn blocking<T, F>(f: F) -> Result<T, (StatusCode, String)>
where
    F: FnOnce() -> matcher::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(error_response)
}

pub async fn classify_handler(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, (StatusCode, String)> {
    let pipeline = state.pipeline.current();
    let text = req.text.clone();
    let role = blocking(move || pipeline.classify_document(&text)).await?;
    let questions = state
        .questions
        .generate_or_placeholder(&req.text, req.questions.min(MAX_QUESTIONS))
        .await;
    Ok(Json(ClassifyResponse { role, questions }))
}

async fn run_match(state: &AppState, req: &MatchRequest) -> Result<(Arc<Pipeline>, JobMatch), (StatusCode, String)> {
    let k = usize::try_from(req.k)
        .map_err(|_| error_response(MatchError::InvalidArgument(format!("k must be positive, got {}", req.k))))?;
    let pipeline = state.pipeline.current();
    let (worker, text) = (Arc::clone(&pipeline), req.text.clone());
    let matched = blocking(move || worker.match_job_description(&text, k)).await?;
    Ok((pipeline, matched))
}

pub async fn match_handler(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, (StatusCode, String)> {
    let (pipeline, matched) = run_match(&state, &req).await?;
    let per_candidate = req.questions_per_candidate.min(MAX_QUESTIONS);

    let mut results = Vec::with_capacity(matched.results.len());
    for r in matched.results {
        let questions = match pipeline.pool().get(&r.id) {
            Some(entry) if per_candidate > 0 => state.questions.generate_or_placeholder(entry.text(), per_candidate).await,
            _ => Vec::new(),
        };
        results.push(CandidateHit { rank: r.rank, id: r.id, category: r.category, similarity: r.similarity, questions });
    }
    Ok(Json(MatchResponse { role: matched.role, pool_size: matched.pool_size, results }))
}

pub async fn export_handler(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (_, matched) = run_match(&state, &req).await?;
    let csv = results_csv(&matched).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"top_candidates.csv\""),
        ],
        csv,
    ))
}

fn results_csv(matched: &JobMatch) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["rank", "identifier", "category", "similarity"])?;
    for r in &matched.results {
        wtr.write_record([r.rank.to_string(), r.id.clone(), r.category.clone(), format!("{:.4}", r.similarity)])?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let (artifacts, corpus) = (state.artifacts_dir.clone(), state.corpus_path.clone());
    let loaded = tokio::task::spawn_blocking(move || Pipeline::load(artifacts, corpus))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    match loaded {
        Ok(pipeline) => {
            let pool_size = pipeline.pool().len();
            state.pipeline.publish(pipeline);
            tracing::info!(pool_size, "published reloaded artifacts");
            Ok(Json(serde_json::json!({ "status": "reloaded", "pool_size": pool_size })))
        }
        Err(e) => {
            tracing::error!(error = %e, "reload failed, keeping current artifacts");
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e}")))
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcher::MatchResult;

    #[test]
    fn csv_export_has_header_and_rows() {
        let matched = JobMatch {
            role: "Python Developer".into(),
            pool_size: 2,
            results: vec![
                MatchResult { rank: 1, id: "12".into(), category: "Python Developer".into(), similarity: 0.81234 },
                MatchResult { rank: 2, id: "7".into(), category: "Python Developer".into(), similarity: 0.5 },
            ],
        };
        let csv = results_csv(&matched).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "rank,identifier,category,similarity");
        assert_eq!(lines[1], "1,12,Python Developer,0.8123");
        assert_eq!(lines[2], "2,7,Python Developer,0.5000");
    }

    #[test]
    fn error_statuses() {
        assert_eq!(error_response(MatchError::InvalidArgument("k".into())).0, StatusCode::BAD_REQUEST);
        assert_eq!(error_response(MatchError::NoCandidates { role: "HR".into() }).0, StatusCode::NOT_FOUND);
        assert_eq!(
            error_response(MatchError::ConfigMismatch(matcher::Mismatch::UnknownClass(3))).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
