//! Chama server library logic.

pub mod api;
pub mod api_calls;
pub mod api_sse;
pub mod config;
pub mod display;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use chama_announce::{Announcer, AudioStore};
use chama_calls::CallStore;
use chama_types::{Catalog, DISPLAY_FEED_LIMIT, PANEL_FEED_LIMIT};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Call persistence and change notifications.
    pub store: CallStore,
    /// Renders and speaks announcements for display sessions.
    pub announcer: Arc<Announcer>,
    /// Synthesized announcement audio, served to displays.
    pub audio: AudioStore,
    /// Rooms and professionals offered by the panel form.
    pub catalog: Arc<Catalog>,
    /// Calls per display snapshot.
    pub display_limit: u32,
    /// Calls in the panel's recent list.
    pub panel_limit: u32,
    /// Built client directory, if any.
    pub client_dir: Option<String>,
}

impl AppState {
    /// State with the default catalog and feed limits.
    pub fn new(store: CallStore, announcer: Arc<Announcer>, audio: AudioStore) -> Self {
        Self {
            store,
            announcer,
            audio,
            catalog: Arc::new(Catalog::default()),
            display_limit: DISPLAY_FEED_LIMIT,
            panel_limit: PANEL_FEED_LIMIT,
            client_dir: None,
        }
    }
}

/// Maximum request body size (64 KiB). Call submissions are tiny.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/api/calls",
            post(api_calls::submit_call_handler)
                .get(api_calls::list_calls_handler)
                .delete(api_calls::reset_calls_handler),
        )
        .route(
            "/api/calls/{callId}",
            axum::routing::delete(api_calls::delete_call_handler),
        )
        .route(
            "/api/calls/{callId}/recall",
            post(api_calls::recall_call_handler),
        )
        .route("/api/catalog", get(api_calls::catalog_handler))
        .route("/api/audio/{assetId}", get(api_calls::audio_handler))
        .route("/events/feed", get(api_sse::feed_stream_handler))
        .route("/events/display", get(api_sse::display_stream_handler));

    // Serve client static files if the directory exists.
    let router = match state.client_dir.as_deref() {
        Some(client_dir) if std::path::Path::new(client_dir).join("index.html").exists() => {
            tracing::info!(path = %client_dir, "serving client static files");
            let index = format!("{}/index.html", client_dir);
            router.fallback_service(ServeDir::new(client_dir).fallback(ServeFile::new(index)))
        }
        Some(client_dir) => {
            tracing::info!(path = %client_dir, "client directory not found, skipping static file serving");
            router
        }
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
