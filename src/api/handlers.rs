//! HTTP request handlers

use super::types::{
    ChatRequest, ChatResponse, ClearResponse, DeleteResponse, ErrorResponse, ExportResponse,
    ListQuery, ResetResponse, SessionListResponse, SessionQuery, StatusResponse,
};
use super::AppState;
use crate::runtime::RESET_ACKNOWLEDGEMENT;
use crate::state_machine::state::MODE_MENU;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 500;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/status", get(status))
        .route("/chat", post(chat))
        .route("/reset", post(reset))
        .route("/export", get(export))
        .route("/sessions", get(list_sessions).delete(delete_session))
        .route("/sessions/clear", post(clear_sessions))
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: format!("OECS gateway active with {}", state.governor.model_id()),
    })
}

/// Always answers 200; gating outcomes are carried in the body
async fn chat(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let response = state.governor.handle_turn(query.id(), &req.message).await;
    Json(ChatResponse { response })
}

async fn reset(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<ResetResponse> {
    state.governor.reset(query.id()).await;
    Json(ResetResponse {
        status: RESET_ACKNOWLEDGEMENT.to_string(),
        prompt: MODE_MENU.to_string(),
    })
}

async fn export(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<ExportResponse> {
    let log = state.governor.export(query.id()).await;
    Json(ExportResponse { log })
}

async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SessionListResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }

    let sessions = state
        .governor
        .list_recent(limit)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(SessionListResponse { sessions }))
}

async fn delete_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Some(id) = query.explicit_id() else {
        return Err(AppError::BadRequest("session parameter is required".to_string()));
    };
    if !state
        .governor
        .delete(id)
        .await
        .map_err(AppError::Internal)?
    {
        return Err(AppError::NotFound(format!("session {id} not found")));
    }
    Ok(Json(DeleteResponse { deleted: true }))
}

async fn clear_sessions(State(state): State<AppState>) -> Result<Json<ClearResponse>, AppError> {
    let cleared = state
        .governor
        .clear_all()
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(ClearResponse { cleared }))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
