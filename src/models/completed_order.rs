use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A finished order as recorded for the counter. `lines` holds the grouped cups as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub id: String,
    pub session_id: String,
    pub summary: String,
    pub cups: u32,
    pub lines: serde_json::Value,
    pub dining_mode: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Pushed to order board subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderEvent {
    Completed { order: CompletedOrder },
    DiningMode { order_id: String, mode: String },
}
