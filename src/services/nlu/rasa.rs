use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{NluProvider, ParsedUtterance};
use crate::models::{drop_classifier_entities, Entity};

pub struct RasaNluProvider {
    url: String,
    client: reqwest::Client,
}

impl RasaNluProvider {
    pub fn new(url: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct ParseResponse {
    intent: Option<IntentRanking>,
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Deserialize)]
struct IntentRanking {
    name: Option<String>,
}

#[async_trait]
impl NluProvider for RasaNluProvider {
    async fn parse(&self, text: &str) -> anyhow::Result<ParsedUtterance> {
        let resp = self
            .client
            .post(format!("{}/model/parse", self.url))
            .json(&json!({ "text": text }))
            .send()
            .await
            .context("failed to call Rasa parse API")?
            .error_for_status()
            .context("Rasa parse API returned an error")?;

        let data: ParseResponse = resp
            .json()
            .await
            .context("failed to parse Rasa response")?;

        Ok(ParsedUtterance {
            intent: data.intent.and_then(|i| i.name),
            entities: drop_classifier_entities(data.entities),
        })
    }
}
