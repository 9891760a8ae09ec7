//! Call handlers for the staff panel.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chama_calls::ResetOutcome;
use chama_types::{CallRecord, CallSubmission, Catalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const CALL_CREATED_NOTICE: &str = "Chamada realizada com sucesso!";
const RESET_DONE_NOTICE: &str = "Histórico de chamadas resetado com sucesso!";
const RESET_EMPTY_NOTICE: &str = "Histórico já estava vazio.";
const RESET_FAILED_NOTICE: &str = "Não foi possível resetar o histórico.";

/// Response body for a created (or re-created) call.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallCreatedResponse {
    pub call: CallRecord,
    pub notice: String,
}

/// Query parameters for `GET /api/calls`.
#[derive(Debug, Deserialize)]
pub struct ListCallsQuery {
    pub limit: Option<u32>,
}

/// Response body for `DELETE /api/calls`.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    #[serde(flatten)]
    pub outcome: ResetOutcome,
    pub notice: &'static str,
}

fn created(call: CallRecord) -> (StatusCode, Json<CallCreatedResponse>) {
    (
        StatusCode::CREATED,
        Json(CallCreatedResponse {
            call,
            notice: CALL_CREATED_NOTICE.to_string(),
        }),
    )
}

/// Handler for `POST /api/calls`.
///
/// Validation failures never reach the store.
pub async fn submit_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CallSubmission>,
) -> Result<(StatusCode, Json<CallCreatedResponse>), ApiError> {
    let new_call = payload.validate().map_err(|e| {
        tracing::debug!(field = e.field(), error = %e, "call submission rejected");
        ApiError::from(e)
    })?;

    let record = state.store.insert(new_call).await?;
    tracing::info!(
        call_id = %record.id,
        room = %record.room_number,
        "patient called"
    );
    Ok(created(record))
}

/// Handler for `GET /api/calls`.
///
/// Defaults to the panel limit and never returns more than the display
/// limit.
pub async fn list_calls_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ListCallsQuery>,
) -> Result<Json<Vec<CallRecord>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.panel_limit)
        .clamp(1, state.display_limit);
    let calls = state.store.recent(limit).await?;
    Ok(Json(calls))
}

/// Handler for `DELETE /api/calls`.
pub async fn reset_calls_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ResetResponse>, ApiError> {
    let outcome = state
        .store
        .reset()
        .await
        .map_err(|e| ApiError::store(RESET_FAILED_NOTICE, e))?;

    let notice = match outcome {
        ResetOutcome::Deleted { .. } => RESET_DONE_NOTICE,
        ResetOutcome::AlreadyEmpty => RESET_EMPTY_NOTICE,
    };
    Ok(Json(ResetResponse { outcome, notice }))
}

/// Handler for `DELETE /api/calls/{callId}`.
pub async fn delete_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(call_id.clone()).await?;
    tracing::info!(call_id = %call_id, "call deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/calls/{callId}/recall`.
///
/// The copy gets a new ID, so displays announce it again.
pub async fn recall_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Result<(StatusCode, Json<CallCreatedResponse>), ApiError> {
    let record = state.store.recall(call_id.clone()).await?;
    tracing::info!(original = %call_id, call_id = %record.id, "patient called again");
    Ok(created(record))
}

/// Handler for `GET /api/catalog`.
pub async fn catalog_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Catalog> {
    Json(state.catalog.as_ref().clone())
}

/// Handler for `GET /api/audio/{assetId}`.
pub async fn audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> Result<Response, ApiError> {
    let clip = state
        .audio
        .get(&asset_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("audio {asset_id}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, clip.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        clip.bytes.as_ref().clone(),
    )
        .into_response())
}
