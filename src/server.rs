//! HTTP API server.
//!
//! Exposes the review workflow over JSON HTTP: similar-case search,
//! question generation with session logging, and feedback capture.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/cases/search` | Rank similar cases for a new idea |
//! | `POST` | `/questions/generate` | Generate questions, open a session log |
//! | `POST` | `/sessions/{session_id}/feedback` | Append feedback to a session |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "not_initialized", "message": "case index is not initialized" } }
//! ```
//!
//! Error codes: `not_initialized` (503), `timeout` (408), `provider_error`
//! (502), `not_found` (404), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser frontend
//! can call the API directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::RecallError;
use crate::index::CaseIndex;
use crate::models::{
    FeedbackRequest, FeedbackResponse, GenerateQuestionsRequest, GenerateQuestionsResponse,
    NewIdea, SearchCasesResponse, SimilarCase,
};
use crate::questions::generate_questions;
use crate::session;
use crate::similarity::search_similar_cases;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    index: Arc<CaseIndex>,
    provider: Arc<dyn EmbeddingProvider>,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated. The index is expected to have been initialized by
/// the caller; a search against an uninitialized index answers 503 rather
/// than crashing.
pub async fn run_server(
    config: Arc<Config>,
    index: Arc<CaseIndex>,
    provider: Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config,
        index,
        provider,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/cases/search", post(handle_search_cases))
        .route("/questions/generate", post(handle_generate_questions))
        .route("/sessions/{session_id}/feedback", post(handle_feedback))
        .layer(cors)
        .with_state(state);

    println!("Server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 Internal Server Error.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map a core error onto the HTTP error contract.
fn classify_recall_error(err: RecallError) -> AppError {
    let message = err.to_string();
    match err {
        RecallError::NotInitialized => AppError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "not_initialized".to_string(),
            message,
        },
        RecallError::ProviderTimeout(_) => AppError {
            status: StatusCode::REQUEST_TIMEOUT,
            code: "timeout".to_string(),
            message,
        },
        RecallError::Provider(_) | RecallError::MalformedResponse(_) => AppError {
            status: StatusCode::BAD_GATEWAY,
            code: "provider_error".to_string(),
            message,
        },
        RecallError::SourceUnavailable(_) => internal(message),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /cases/search ============

/// Handler for `POST /cases/search`.
///
/// Ranks the corpus against the submitted idea and returns the top
/// `[search].top_k` cases as lightweight projections.
async fn handle_search_cases(
    State(state): State<AppState>,
    Json(idea): Json<NewIdea>,
) -> Result<Json<SearchCasesResponse>, AppError> {
    let scored = search_similar_cases(
        &state.index,
        state.provider.as_ref(),
        &idea,
        state.config.search.top_k,
    )
    .await
    .map_err(classify_recall_error)?;

    let similar_cases: Vec<SimilarCase> = scored.iter().map(|s| SimilarCase::from(&s.case)).collect();

    Ok(Json(SearchCasesResponse { similar_cases }))
}

// ============ POST /questions/generate ============

/// Handler for `POST /questions/generate`.
///
/// Looks up the selected cases by id (ids not present in the corpus are
/// skipped), generates the question set, and opens a session log.
async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    let snapshot = state.index.snapshot().await.map_err(classify_recall_error)?;

    let wanted: HashSet<&str> = request
        .similar_case_ids
        .iter()
        .map(|id| id.as_str())
        .collect();
    let selected: Vec<_> = snapshot
        .cases()
        .iter()
        .filter(|c| wanted.contains(c.id.as_str()))
        .cloned()
        .collect();

    let questions = generate_questions(&request.idea, &selected);

    let session_id = session::create_session(
        &state.config.logs.dir,
        &request.idea,
        &selected,
        &questions,
    )
    .map_err(|e| internal(e.to_string()))?;

    Ok(Json(GenerateQuestionsResponse {
        session_id,
        questions,
    }))
}

// ============ POST /sessions/{session_id}/feedback ============

/// Handler for `POST /sessions/{session_id}/feedback`.
async fn handle_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let saved_count =
        session::append_feedback(&state.config.logs.dir, &session_id, &request.feedbacks)
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("not found") {
                    not_found(msg)
                } else {
                    internal(msg)
                }
            })?;

    Ok(Json(FeedbackResponse {
        session_id,
        saved_count,
    }))
}
