use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Entity, KioskAction};
use crate::services::actions::Turn;
use crate::services::kiosk;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DevMessage {
    pub sender_id: String,
    pub text: String,
}

#[derive(Serialize)]
pub struct DevResponse {
    pub intent: Option<String>,
    pub action: Option<&'static str>,
    pub entities: Vec<Entity>,
    pub replies: Vec<String>,
}

/// Runs raw text through the NLU provider and the matching action, skipping the
/// dialogue manager.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DevMessage>,
) -> Result<Json<DevResponse>, AppError> {
    let sender_id = payload.sender_id.trim().to_string();
    let text = payload.text.trim().to_string();
    if sender_id.is_empty() {
        return Err(AppError::BadRequest("sender_id is required".to_string()));
    }

    let parsed = state
        .nlu
        .parse(&text)
        .await
        .map_err(|e| AppError::Nlu(e.to_string()))?;

    let action = parsed.intent.as_deref().and_then(KioskAction::from_intent);
    tracing::debug!(session = %sender_id, intent = ?parsed.intent, action = ?action, "dev message");

    let replies = match action {
        Some(action) => {
            let turn = Turn::new(text, parsed.entities.clone());
            kiosk::process_turn(&state, &sender_id, action, &turn)
        }
        None => Vec::new(),
    };

    Ok(Json(DevResponse {
        intent: parsed.intent,
        action: action.map(|a| a.as_str()),
        entities: parsed.entities,
        replies,
    }))
}
