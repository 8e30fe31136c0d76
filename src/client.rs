//! Outbound call to the chat completions endpoint.

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::extract::extract_answer;
use crate::models::answer::{Answer, Fallback};
use crate::models::chat::ChatCompletionRequest;
use crate::prompt::build_request;

/// Failures of the single outbound completion call. All of them are terminal for the
/// request and surface to callers as `Fallback::RequestFailed`.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("completion request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("completion endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("completion response is not JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Client for the completion endpoint. Holds one pooled `reqwest::Client`; clone freely.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    url: String,
    model: String,
    token: Option<String>,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        Ok(Self {
            http: build_http_client(config)?,
            url: config.completions_url.clone(),
            model: config.model.clone(),
            token: config.api_token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `request` once and return the parsed JSON body.
    /// Non-2xx statuses are errors; there is no retry.
    pub async fn send(&self, request: &ChatCompletionRequest) -> Result<Value, CompletionError> {
        let mut rb = self
            .http
            .post(&self.url)
            .header(http::header::CONTENT_TYPE, "application/json")
            .json(request);
        if let Some(token) = &self.token {
            rb = rb.bearer_auth(token);
        }

        let resp = rb.send().await.map_err(CompletionError::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            let bytes = resp.bytes().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let body: Value = resp.json().await.map_err(CompletionError::Decode)?;
        tracing::debug!(body = %body, "completion response");
        Ok(body)
    }

    /// Ask the model `question` and return its answer or a fallback sentinel.
    pub async fn ask(&self, question: &str) -> Answer {
        let request = build_request(question, &self.model);
        match self.send(&request).await {
            Ok(body) => {
                let extracted = extract_answer(&body);
                if extracted.is_fallback() {
                    tracing::warn!(?extracted, "completion response did not carry an answer");
                }
                extracted.into()
            }
            Err(e) => {
                tracing::error!(error = %e, url = %self.url, "completion call failed");
                Fallback::RequestFailed.into()
            }
        }
    }
}

/// Build the outbound HTTP client from configuration.
///
/// - `http_timeout` -> overall request timeout (none by default)
/// - `insecure_skip_tls_verify` -> accept any certificate (explicit opt-in only)
/// - HTTPS_PROXY / https_proxy -> HTTPS proxy
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, CompletionError> {
    let mut builder = reqwest::Client::builder();

    if let Some(t) = config.http_timeout {
        builder = builder.timeout(t);
    }

    if config.insecure_skip_tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Ok(https_p) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("https_proxy")) {
        let u = https_p.trim();
        if !u.is_empty() {
            if let Ok(p) = reqwest::Proxy::https(u) {
                builder = builder.proxy(p);
            }
        }
    }

    // User-Agent for observability
    builder = builder.user_agent(format!("question2answer/{}", env!("CARGO_PKG_VERSION")));

    builder.build().map_err(CompletionError::Client)
}
