//! HTTP server for the search relay and the knowledge chatbot.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/` | Service banner |
//! | `GET`    | `/health` | Health check, reports whether the API key is configured |
//! | `POST`   | `/api/search/query` | Relay a general query to the model |
//! | `GET`    | `/api/search/status` | Search service status |
//! | `POST`   | `/api/chatbot/ask` | Answer a question from the knowledge base |
//! | `POST`   | `/api/chatbot/upload` | Upload a `.txt` or `.pdf` (multipart field `file`) |
//! | `GET`    | `/api/chatbot/documents` | List stored documents |
//! | `DELETE` | `/api/chatbot/documents/{id}` | Delete one document |
//! | `DELETE` | `/api/chatbot/reset` | Clear the knowledge base |
//! | `GET`    | `/api/chatbot/status` | Chatbot status |
//!
//! # Error Contract
//!
//! Request-level failures use the JSON error body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Only PDF and TXT files are supported" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `payload_too_large` (413), `unsupported_media_type` (415),
//! `invalid_request` (422), `extraction_failed` (500), `internal` (500).
//! Malformed JSON and multipart bodies are reported with the same body.
//!
//! Generation failures on `/ask` and `/query` are not HTTP errors: they come
//! back with `ok: false` and the message in the answer/response field.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser front-ends on
//! other origins can call the API.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, FromRequest, Multipart, Path, Request, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use knowledge_relay_core::{
    DocumentSummary, KnowledgeChatbot, KnowledgeError, KnowledgeStore, QueryRelay, TextGenerator,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::ingest;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<KnowledgeStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub chatbot: Arc<KnowledgeChatbot>,
    pub relay: Arc<QueryRelay>,
}

impl AppState {
    /// Wire an empty store and both services around `generator`.
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> anyhow::Result<Self> {
        config.validate()?;
        let store = Arc::new(KnowledgeStore::new(config.chunking.chunk_size()?));
        let chatbot = KnowledgeChatbot::new(store.clone(), generator.clone())
            .with_top_k(config.retrieval.top_k)
            .with_options(config.chatbot.options());
        let relay = QueryRelay::new(generator.clone()).with_options(config.search.options());
        Ok(Self {
            config: Arc::new(config),
            store,
            generator,
            chatbot: Arc::new(chatbot),
            relay: Arc::new(relay),
        })
    }
}

/// Build the generation client from config, reading the API key once.
///
/// A missing key is logged and the server keeps running; generation calls
/// then fail with a user-visible error.
pub fn generator_from_config(config: &Config) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let api_key = config.generation.api_key();
    if api_key.is_some() {
        info!(env = %config.generation.api_key_env, "API key loaded");
    } else {
        warn!(
            env = %config.generation.api_key_env,
            "API key not found; the server will start but generation calls will fail"
        );
    }
    Ok(Arc::new(GeminiClient::new(&config.generation, api_key)?))
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind` (or `0.0.0.0:$PORT`) and serves until the
/// process receives Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let generator = generator_from_config(config)?;
    let state = AppState::new(config.clone(), generator)?;
    let bind_addr = config.bind_addr();

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "server listening");
    info!("search relay: /api/search, knowledge chatbot: /api/chatbot");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Assemble all routes with CORS, tracing, and the upload size limit.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let search = Router::new()
        .route("/query", post(handle_search_query))
        .route("/status", get(handle_search_status));

    let chatbot = Router::new()
        .route("/ask", post(handle_ask))
        .route("/upload", post(handle_upload))
        .route("/documents", get(handle_list_documents))
        .route("/documents/{id}", delete(handle_delete_document))
        .route("/reset", delete(handle_reset))
        .route("/status", get(handle_chatbot_status));

    let max_upload = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .nest("/api/search", search)
        .nest("/api/chatbot", chatbot)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

/// Map an extractor rejection onto the JSON error body, keeping its status.
fn rejected(status: StatusCode, message: String) -> AppError {
    let code = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
        StatusCode::UNPROCESSABLE_ENTITY => "invalid_request",
        s if s.is_server_error() => "internal",
        _ => "bad_request",
    };
    AppError {
        status,
        code,
        message,
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        rejected(rejection.status(), rejection.body_text())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        rejected(err.status(), err.body_text())
    }
}

/// `Json` extractor whose rejections use the JSON error body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<KnowledgeError> for AppError {
    fn from(err: KnowledgeError) -> Self {
        let message = err.to_string();
        match err {
            KnowledgeError::Validation(_) => bad_request(message),
            KnowledgeError::NotFound(_) => AppError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message,
            },
            KnowledgeError::Extraction { .. } | KnowledgeError::Decoding { .. } => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "extraction_failed",
                message,
            },
            KnowledgeError::Generation(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message,
            },
        }
    }
}

// ============ GET / and GET /health ============

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Knowledge Relay API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "online",
        "apps": {
            "search_engine": "/api/search",
            "knowledge_chatbot": "/api/chatbot",
        },
    }))
}

/// Handler for `GET /health`.
///
/// Always healthy while the process runs; `gemini_api` tells operators
/// whether generation calls can succeed.
async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let api = if state.generator.is_configured() {
        "connected"
    } else {
        "not_configured"
    };
    Json(serde_json::json!({
        "status": "healthy",
        "services": {
            "search_engine": "operational",
            "knowledge_chatbot": "operational",
        },
        "gemini_api": api,
    }))
}

// ============ Search relay ============

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub ok: bool,
    pub query: String,
    pub response: String,
}

async fn handle_search_query(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    match state.relay.perform_search(&req.query).await {
        Ok(response) => Ok(Json(SearchResponse {
            ok: true,
            query: req.query,
            response,
        })),
        Err(KnowledgeError::Generation(e)) => Ok(Json(SearchResponse {
            ok: false,
            query: req.query,
            response: format!("Error: {}", e),
        })),
        Err(e) => Err(e.into()),
    }
}

async fn handle_search_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "operational",
        "model": state.relay.model_name(),
    }))
}

// ============ Knowledge chatbot ============

#[derive(Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub ok: bool,
    pub question: String,
    pub answer: String,
    pub sources: Vec<String>,
}

/// Handler for `POST /api/chatbot/ask`.
///
/// `sources` lists every stored filename, not only the retrieved ones.
async fn handle_ask(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    match state.chatbot.ask(&req.question).await {
        Ok(answer) => Ok(Json(ChatResponse {
            ok: true,
            question: req.question,
            answer: answer.into_text(),
            sources: state.chatbot.sources(),
        })),
        Err(KnowledgeError::Generation(e)) => Ok(Json(ChatResponse {
            ok: false,
            question: req.question,
            answer: format!("Error: {}", e),
            sources: Vec::new(),
        })),
        Err(e) => Err(e.into()),
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub message: String,
    pub document_id: String,
    pub filename: String,
}

/// Handler for `POST /api/chatbot/upload`.
///
/// Reads the multipart field named `file`. The extension is checked before
/// the body is read into memory; a body over `max_upload_bytes` is a 413.
async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| bad_request("file field has no filename"))?;
        ingest::kind_for(&filename)?;

        let bytes = field.bytes().await?;

        let document_id =
            ingest::add_document_blocking(state.store.clone(), filename.clone(), bytes.to_vec())
                .await?;

        return Ok(Json(UploadResponse {
            ok: true,
            message: format!("Document '{}' uploaded successfully", filename),
            document_id,
            filename,
        }));
    }

    Err(bad_request("multipart field 'file' is required"))
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub ok: bool,
    pub count: usize,
    pub documents: Vec<DocumentSummary>,
}

async fn handle_list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let documents = state.store.list();
    Json(DocumentListResponse {
        ok: true,
        count: documents.len(),
        documents,
    })
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub message: String,
}

async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete(&id)?;
    Ok(Json(MessageResponse {
        ok: true,
        message: "Document deleted".to_string(),
    }))
}

async fn handle_reset(State(state): State<AppState>) -> Json<MessageResponse> {
    state.store.clear();
    Json(MessageResponse {
        ok: true,
        message: "Knowledge base cleared".to_string(),
    })
}

async fn handle_chatbot_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "operational",
        "model": state.chatbot.model_name(),
        "documents_count": state.store.len(),
        "chunks_count": state.store.chunk_count(),
        "rag_enabled": true,
    }))
}
