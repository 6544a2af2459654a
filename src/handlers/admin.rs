use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::CompletedOrder;
use crate::services::session::SessionSummary;
use crate::state::AppState;

pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/orders
#[derive(Deserialize)]
pub struct OrdersQuery {
    pub limit: Option<i64>,
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<CompletedOrder>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let orders = {
        let db = state.db.lock().unwrap();
        queries::list_completed_orders(&db, limit).map_err(|e| AppError::Internal(e.to_string()))?
    };
    Ok(Json(orders))
}

// GET /api/admin/sessions
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let summaries = state.sessions.lock().unwrap().summaries();
    Ok(Json(summaries))
}

// POST /api/admin/sessions/:id/clear
pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if !state.sessions.lock().unwrap().clear(&id) {
        return Err(AppError::NotFound(format!("session {id}")));
    }
    tracing::info!(session = %id, "cart cleared by admin");
    Ok(Json(serde_json::json!({"ok": true})))
}
