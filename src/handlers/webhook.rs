use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::errors::AppError;
use crate::models::{drop_classifier_entities, Entity, KioskAction};
use crate::services::actions::Turn;
use crate::services::kiosk;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-kiosk-signature";

#[derive(Debug, Deserialize)]
pub struct ActionCall {
    pub next_action: String,
    pub sender_id: Option<String>,
    #[serde(default)]
    pub tracker: Tracker,
}

#[derive(Debug, Default, Deserialize)]
pub struct Tracker {
    pub sender_id: Option<String>,
    #[serde(default)]
    pub latest_message: LatestMessage,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestMessage {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Serialize)]
pub struct BotResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub events: Vec<serde_json::Value>,
    pub responses: Vec<BotResponse>,
}

/// base64(HMAC-SHA1(secret, body))
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha1>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

pub async fn action_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ActionResponse>, AppError> {
    // Signatures are only enforced once a secret is configured.
    if !state.config.webhook_secret.is_empty() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(&state.config.webhook_secret, signature, &body) {
            tracing::warn!(present = !signature.is_empty(), "rejected webhook signature");
            return Err(AppError::Unauthorized);
        }
    }

    let call: ActionCall = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid action call: {e}")))?;

    let Some(action) = KioskAction::parse(&call.next_action) else {
        tracing::warn!(action = %call.next_action, "unknown action");
        return Err(AppError::BadRequest(format!(
            "unknown action: {}",
            call.next_action
        )));
    };

    let session_id = call
        .sender_id
        .or(call.tracker.sender_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing sender_id".to_string()))?;

    let message = call.tracker.latest_message;
    let turn = Turn::new(message.text, drop_classifier_entities(message.entities));
    let replies = kiosk::process_turn(&state, &session_id, action, &turn);

    Ok(Json(ActionResponse {
        events: Vec::new(),
        responses: replies
            .into_iter()
            .map(|text| BotResponse { text })
            .collect(),
    }))
}
