use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub rasa_url: String,
    pub vocabulary_path: Option<String>,
    pub webhook_secret: String,
    pub session_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "kiosk.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            rasa_url: env::var("RASA_URL").unwrap_or_else(|_| "http://localhost:5005".to_string()),
            vocabulary_path: env::var("VOCABULARY_PATH").ok().filter(|p| !p.is_empty()),
            webhook_secret: env::var("WEBHOOK_SECRET").unwrap_or_default(),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(30),
        }
    }
}
