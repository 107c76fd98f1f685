//! Adapter for the external interview-question generator.
//!
//! Failures never reach the caller as errors: [`Questions`] turns them into a
//! single placeholder line and logs a warning.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

lazy_static! {
    static ref LIST_MARKER: Regex = Regex::new(r"^(?:[•\-*]\s*|\d+[.)]\s*)+").expect("valid regex");
}

pub const PLACEHOLDER: &str = "(no questions could be generated)";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Up to `n` questions tailored to `text`.
    async fn generate(&self, text: &str, n: usize) -> Result<Vec<String>>;
}

/// Used when no generator is configured; always degrades to the placeholder.
pub struct DisabledGenerator;

#[async_trait]
impl QuestionGenerator for DisabledGenerator {
    async fn generate(&self, _text: &str, _n: usize) -> Result<Vec<String>> {
        Err(anyhow!("question generation is not configured"))
    }
}

/// Calls a `generateContent` REST endpoint.
pub struct HttpQuestionGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }
}

impl HttpQuestionGenerator {
    pub fn new(endpoint: String, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: endpoint.trim_end_matches('/').to_string(), api_key, model })
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuestionGenerator {
    async fn generate(&self, text: &str, n: usize) -> Result<Vec<String>> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(text, n) }] }]
        });
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: GenerateResponse = resp.json().await?;
        Ok(parse_questions(&parsed.text(), n))
    }
}

pub fn build_prompt(text: &str, n: usize) -> String {
    format!(
        "Generate exactly {n} concise, technical interview questions, numbered 1-{n}, \
         tailored to the following text:\n\n{}",
        text.trim()
    )
}

/// One question per non-empty line, bullets and numbering stripped.
pub fn parse_questions(reply: &str, n: usize) -> Vec<String> {
    reply
        .lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .filter(|q| !q.is_empty())
        .take(n)
        .collect()
}

#[derive(Clone)]
pub struct Questions {
    generator: Arc<dyn QuestionGenerator>,
}

impl Questions {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self { generator }
    }

    /// Never fails: errors and empty replies become `[PLACEHOLDER]`.
    pub async fn generate_or_placeholder(&self, text: &str, n: usize) -> Vec<String> {
        if n == 0 {
            return Vec::new();
        }
        match self.generator.generate(text, n).await {
            Ok(qs) => {
                let qs: Vec<String> = qs.into_iter().filter(|q| !q.trim().is_empty()).take(n).collect();
                if qs.is_empty() {
                    tracing::warn!("question generator returned no content");
                    vec![PLACEHOLDER.to_string()]
                } else {
                    qs
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "question generation failed");
                vec![PLACEHOLDER.to_string()]
            }
        }
    }
}
