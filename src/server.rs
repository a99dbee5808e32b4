//! HTTP API server.
//!
//! Exposes the query pipeline as a small JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/query` | Answer an emergency question from the ingested manual |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must be at least 3 characters" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Input validation happens here, before the core pipeline: a too-short
//! query or an out-of-range `top_k` never reaches retrieval. A query
//! that retrieves nothing is a 404; the safety redirect is a normal 200.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::models::{Answer, QueryContext};
use crate::retriever::{Outcome, Retriever};

/// Shared state for all route handlers.
#[derive(Clone)]
struct AppState {
    retriever: Arc<Retriever>,
}

/// Start the HTTP server on the configured bind address.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config, retriever: Arc<Retriever>) -> anyhow::Result<()> {
    let state = AppState { retriever };

    let cors = build_cors(config.server.allow_origins.as_deref());

    let app = Router::new()
        .route("/query", post(handle_query))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(bind = %config.server.bind, "server listening");

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS layer from the comma-separated origin list; an empty or absent
/// list permits any origin.
fn build_cors(allow_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allow_origins
        .unwrap_or_default()
        .split(',')
        .filter_map(|o| {
            let trimmed = o.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse().ok()
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /query ============

/// Request body for `POST /query`.
#[derive(Debug, Deserialize)]
struct QueryRequest {
    /// Natural-language emergency description, at least 3 characters.
    query: String,
    /// Requested result count, 1 to 10.
    #[serde(default)]
    top_k: Option<usize>,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Answer>, AppError> {
    if req.query.trim().len() < 3 {
        return Err(bad_request("query must be at least 3 characters"));
    }
    if let Some(k) = req.top_k {
        if !(1..=10).contains(&k) {
            return Err(bad_request("top_k must be between 1 and 10"));
        }
    }

    let ctx = QueryContext {
        query: req.query.clone(),
        top_k: req.top_k,
        intent: None,
    };

    let outcome = state.retriever.retrieve(&ctx).await.map_err(|e| {
        error!(error = %e, "query pipeline failed");
        internal(e.to_string())
    })?;

    match outcome {
        Outcome::Redirect(answer) => Ok(Json(answer)),
        Outcome::Empty => Err(not_found(
            "No relevant manual sections found. Did you run ingestion?",
        )),
        Outcome::Chunks(chunks) => Ok(Json(crate::answer::build_answer(&req.query, &chunks))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_parses_origin_list() {
        // Exercises the parse path; malformed entries are dropped.
        let _ = build_cors(Some("http://localhost:5173, http://app.example.com"));
        let _ = build_cors(Some(""));
        let _ = build_cors(None);
    }
}
