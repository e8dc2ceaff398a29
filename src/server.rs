//! HTTP query service.
//!
//! Serves retrieval-augmented question answering over the vector index via a
//! small JSON API, plus a static browser client.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a question grounded in the indexed corpus |
//! | `GET`  | `/` | Service info (name, version, endpoints) |
//! | `GET`  | `/ui` | Browser client page |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `embedding_failed` (502),
//! `generation_failed` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the bundled page and
//! other browser clients can call the API from any origin.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::generation::Generator;
use crate::models::Answer;
use crate::retrieve::Retriever;
use crate::synthesize::synthesize;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor. Constructed once at startup; every request shares read-only
/// access to the index through the retriever.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration (wrapped in `Arc` for cheap cloning across handlers).
    pub config: Arc<Config>,
    /// Query embedder plus vector index.
    pub retriever: Retriever,
    /// Generative model client used to synthesize answers.
    pub generator: Arc<dyn Generator>,
}

/// Builds the service router with all routes and the CORS layer applied.
///
/// Split out from [`run_server`] so tests can mount the router on an
/// ephemeral port with stub model clients.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_info))
        .route("/ask", post(handle_ask))
        .route("/ui", get(handle_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the query service.
///
/// Binds to the address configured in `[server].bind` and serves requests
/// until the process is terminated.
pub async fn run_server(
    config: &Config,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        retriever,
        generator,
    };

    let app = build_router(state);

    println!("query service listening on http://{}", bind_addr);

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

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 502 error for embedding-service failures during retrieval.
fn embedding_failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "embedding_failed".to_string(),
        message: message.into(),
    }
}

/// Constructs a 502 error for generative-model failures.
fn generation_failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "generation_failed".to_string(),
        message: message.into(),
    }
}

// ============ GET / ============

/// JSON response body for `GET /`.
#[derive(Serialize)]
struct InfoResponse {
    service: String,
    version: String,
    endpoints: InfoEndpoints,
}

/// Endpoint listing inside the info response.
#[derive(Serialize)]
struct InfoEndpoints {
    ask: String,
    ui: String,
}

/// Handler for `GET /`.
///
/// Returns the service name, version, and available endpoints.
async fn handle_info() -> Json<InfoResponse> {
    Json(InfoResponse {
        service: "climate-rag".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: InfoEndpoints {
            ask: "POST /ask".to_string(),
            ui: "GET /ui".to_string(),
        },
    })
}

// ============ GET /ui ============

/// Handler for `GET /ui`. Serves the embedded browser client page.
async fn handle_ui() -> Html<&'static str> {
    Html(include_str!("ui.html"))
}

// ============ POST /ask ============

/// JSON request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

/// Handler for `POST /ask`.
///
/// Embeds the question, retrieves the top-k chunks from the index, and asks
/// the generative model for an answer grounded in them.
///
/// Returns `400` for an empty question, `502 embedding_failed` when the
/// embedding service is unreachable, and `502 generation_failed` when the
/// model call fails. The model call runs on its own spawned task and is
/// joined before responding, so a slow generation never stalls the accept
/// loop.
async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, AppError> {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return Err(bad_request("question must not be empty"));
    }

    let k = state.config.retrieval.top_k;
    let retrieved = state
        .retriever
        .retrieve(&question, k)
        .await
        .map_err(|e| embedding_failed(format!("retrieval failed: {:#}", e)))?;

    let generator = state.generator.clone();
    let answer = tokio::task::spawn(async move {
        synthesize(generator.as_ref(), &question, &retrieved).await
    })
    .await
    .map_err(|e| generation_failed(format!("generation task failed: {}", e)))?
    .map_err(|e| generation_failed(format!("generation failed: {:#}", e)))?;

    Ok(Json(answer))
}
