use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::models::OrderEvent;
use crate::services::nlu::NluProvider;
use crate::services::session::SessionStore;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub sessions: Mutex<SessionStore>,
    pub nlu: Box<dyn NluProvider>,
    pub order_tx: broadcast::Sender<OrderEvent>,
}
