use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use http::StatusCode;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{CompletionClient, CompletionError};
use crate::config::Config;
use crate::models::answer::Answer;
use crate::upload::{UploadResolver, UploadedFile};
use crate::util::{cors_layer_from_env, error_response};

/// Shared application state used by the HTTP server, handlers and the `ask` command.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: CompletionClient,
    pub uploads: UploadResolver,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, CompletionError> {
        Ok(Self {
            client: CompletionClient::new(config)?,
            uploads: UploadResolver::new(&config.scratch_dir, config.accept_bare_csv),
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}

/// Build the Axum router with `/api/` and `/status`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    let state = Arc::new(state);

    Router::new()
        .route("/status", get(status))
        .route("/api/", post(answer))
        .route("/api", post(answer))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer_from_env())
}

/// Answer `question`: a CSV inside the upload wins, otherwise ask the model.
pub async fn answer_question(state: &AppState, question: &str, file: Option<UploadedFile>) -> Answer {
    if file.is_some() {
        let uploads = state.uploads.clone();
        let resolved = tokio::task::spawn_blocking(move || uploads.resolve(file.as_ref())).await;
        match resolved {
            Ok(Some(answer)) => return Answer::new(answer),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "upload resolution task failed"),
        }
    }
    state.client.ask(question).await
}

/// Service status endpoint listing the available routes.
async fn status() -> impl IntoResponse {
    let routes = vec!["/status", "/api/"];
    Json(serde_json::json!({
        "name": "question2answer",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": routes
    }))
}

/// `POST /api/` with multipart fields `question` (required) and `file` (optional).
/// Always answers `200 {"answer": ...}` once the form is valid; failures are folded into
/// the answer text.
async fn answer(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("answer", %request_id);

    async move {
        let (question, file) = match read_form(multipart).await {
            Ok(form) => form,
            Err(msg) => {
                tracing::warn!(%msg, "rejecting malformed form");
                return error_response(StatusCode::UNPROCESSABLE_ENTITY, &msg);
            }
        };
        let Some(question) = question else {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "missing required form field: question",
            );
        };

        tracing::info!(
            question_len = question.len(),
            has_file = file.is_some(),
            "answering question"
        );
        Json(answer_question(&state, &question, file).await).into_response()
    }
    .instrument(span)
    .await
}

/// Pull `question` and `file` out of the multipart body. Unknown fields are ignored and an
/// empty file part (what browsers send for an untouched file input) counts as no file.
async fn read_form(mut multipart: Multipart) -> Result<(Option<String>, Option<UploadedFile>), String> {
    let mut question = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("question") => {
                question = Some(field.text().await.map_err(|e| e.body_text())?);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| e.body_text())?;
                if !(filename.is_empty() && bytes.is_empty()) {
                    file = Some(UploadedFile { filename, bytes });
                }
            }
            _ => {}
        }
    }

    Ok((question, file))
}
