use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::settings::{ApiKey, Settings};

/// How long a single model call may take. Prompts embed whole pages.
const MODEL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("rate limited (HTTP 429): {0}")]
    RateLimited(String),
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    /// Bad request, bad credential, unknown model. Retrying cannot help.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("response contained no text")]
    EmptyResponse,
}

impl ModelError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ModelError::RateLimited(_))
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, ModelError::Rejected { .. })
    }

    pub fn from_status(status: StatusCode, message: String) -> ModelError {
        match status.as_u16() {
            429 => ModelError::RateLimited(message),
            s if status.is_server_error() => ModelError::Server { status: s, message },
            // 408 is a timeout on the provider side
            408 => ModelError::Server { status: 408, message },
            s => ModelError::Rejected { status: s, message },
        }
    }
}

/// Text completion: one prompt in, the model's reply text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

// ── Gemini ──

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    #[serde(default)]
    text: String,
}

/// Google Generative Language API client (`models/{model}:generateContent`).
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: ApiKey,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(MODEL_TIMEOUT)
            .build()
            .context("Failed to create model HTTP client")?;
        Ok(GeminiClient {
            http_client,
            api_key: settings.api_key.clone(),
            base_url: settings.model_base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let start = Instant::now();
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![PartIn { text: prompt }] }],
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::from_status(status, error_text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Network(format!("unreadable response body: {}", e)))?;

        let text = response_text(parsed);
        debug!(
            "Model {} replied with {} chars in {}ms",
            self.model,
            text.len(),
            start.elapsed().as_millis()
        );
        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

fn response_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default()
}
