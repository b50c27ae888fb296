//! HTTP server with the album and chat REST endpoints.

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::{
    chat::ChatProxy,
    error::ApiError,
    middleware::{create_body_limit_layer, create_cors_layer, request_logging_middleware},
    record::Album,
    settings::Settings,
    store::{Consistency, RecordStore},
};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: RecordStore,
    pub chat: ChatProxy,
    pub settings: Settings,
}

impl AppState {
    /// Wire up the store and chat proxy described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = RecordStore::from_settings(&settings.storage)?;
        let api_key = settings.chat.api_key.clone().unwrap_or_default();

        Ok(Self {
            store,
            chat: ChatProxy::new(api_key),
            settings: settings.clone(),
        })
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    backend: &'static str,
    consistency: Consistency,
    #[serde(skip_serializing_if = "Option::is_none")]
    albums: Option<usize>,
}

/// Chat request body
#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

/// Chat response body
#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

/// Create the HTTP router with all endpoints and middleware
pub fn create_router(state: AppState) -> Router {
    let cors_layer = create_cors_layer(&state.settings.server);
    let body_limit_layer = create_body_limit_layer(state.settings.server.max_request_size_mb);

    Router::new()
        .route("/health", get(health_check))
        .route("/albums", post(create_album))
        .route("/albums/:id", get(get_album))
        .route("/chatgpt", post(chat))
        .fallback(not_found)
        .with_state(state)
        .layer(body_limit_layer)
        .layer(cors_layer)
        .layer(middleware::from_fn(request_logging_middleware))
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.store.backend_name(),
        consistency: state.store.consistency(),
        albums: state.store.len_hint(),
    })
}

/// Fetch an album by id
#[instrument(skip(state))]
async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Album>, ApiError> {
    let album = state.store.get(&id).await?;
    Ok(Json(album))
}

/// Create or replace an album
#[instrument(skip(state, body))]
async fn create_album(
    State(state): State<AppState>,
    body: Result<Json<Album>, JsonRejection>,
) -> Result<(StatusCode, Json<Album>), ApiError> {
    let Json(album) = body.map_err(|rejection| {
        warn!("Rejected album body: {}", rejection.body_text());
        ApiError::InvalidInput
    })?;

    let stored = state.store.put(album).await?;
    info!("Stored album {}", stored.id);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Forward a prompt to the chat upstream
#[instrument(skip(state, body))]
async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected chat body: {}", rejection.body_text());
        ApiError::InvalidInput
    })?;

    let response = state.chat.complete(&request.message).await?;
    Ok(Json(ChatResponse { response }))
}

/// Fallback body for unmatched routes
async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "route not found" })))
}

/// Start the HTTP server and wait for shutdown signal
pub async fn serve(settings: &Settings) -> Result<()> {
    let state = AppState::from_settings(settings)?;
    let app = create_router(state);

    let host = settings.server.host.as_str();
    let port = settings.server.port;
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("HTTP server error")?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
