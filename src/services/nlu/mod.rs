pub mod rasa;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Entity;

/// Intent name and entities recognized in one utterance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedUtterance {
    pub intent: Option<String>,
    pub entities: Vec<Entity>,
}

#[async_trait]
pub trait NluProvider: Send + Sync {
    async fn parse(&self, text: &str) -> anyhow::Result<ParsedUtterance>;
}
