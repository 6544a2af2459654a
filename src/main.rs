use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use kiosk::config::AppConfig;
use kiosk::db;
use kiosk::handlers;
use kiosk::models::Vocabulary;
use kiosk::services::nlu::rasa::RasaNluProvider;
use kiosk::services::normalize::Normalizer;
use kiosk::services::session::SessionStore;
use kiosk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let vocabulary = Vocabulary::load(config.vocabulary_path.as_deref())?;
    tracing::info!(
        drinks = vocabulary.drinks.len(),
        custom = config.vocabulary_path.is_some(),
        "vocabulary loaded"
    );
    let normalizer = Arc::new(Normalizer::new(&vocabulary));

    tracing::info!("using Rasa NLU (url: {})", config.rasa_url);
    let nlu = RasaNluProvider::new(config.rasa_url.clone());

    if config.webhook_secret.is_empty() {
        tracing::warn!("WEBHOOK_SECRET not set, action calls are not signature-checked");
    }

    let (order_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        sessions: Mutex::new(SessionStore::new(normalizer, config.session_ttl_minutes)),
        nlu: Box::new(nlu),
        order_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook", post(handlers::webhook::action_webhook))
        .route("/api/dev/message", post(handlers::dev::send_message))
        .route("/api/admin/orders", get(handlers::admin::list_orders))
        .route("/api/admin/sessions", get(handlers::admin::list_sessions))
        .route(
            "/api/admin/sessions/:id/clear",
            post(handlers::admin::clear_session),
        )
        .route("/api/orders/events", get(handlers::events::order_events))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
