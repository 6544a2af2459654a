use serde::{Deserialize, Serialize};

/// Extractor whose spans duplicate the rule-based extractors and are never used.
pub const CLASSIFIER_EXTRACTOR: &str = "DIETClassifier";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    DrinkType,
    Temperature,
    Size,
    Quantity,
    AdditionalOptions,
    Add,
    Subtract,
    Take,
    #[serde(other)]
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::DrinkType => "drink_type",
            EntityKind::Temperature => "temperature",
            EntityKind::Size => "size",
            EntityKind::Quantity => "quantity",
            EntityKind::AdditionalOptions => "additional_options",
            EntityKind::Add => "add",
            EntityKind::Subtract => "subtract",
            EntityKind::Take => "take",
            EntityKind::Other => "other",
        }
    }
}

/// A typed span extracted from one utterance. `start`/`end` are character offsets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    #[serde(rename = "entity")]
    pub kind: EntityKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<String>,
}

impl Entity {
    pub fn new(kind: EntityKind, value: &str, start: usize, end: usize) -> Self {
        Self {
            kind,
            value: value.to_string(),
            start,
            end,
            extractor: None,
        }
    }

    pub fn within(&self, start: usize, end: usize) -> bool {
        self.start >= start && self.end <= end
    }
}

/// Copies the entities in ascending `start` order. Ties keep their input order.
pub fn sorted_entities(entities: &[Entity]) -> Vec<Entity> {
    let mut sorted = entities.to_vec();
    sorted.sort_by_key(|e| e.start);
    sorted
}

pub fn drop_classifier_entities(entities: Vec<Entity>) -> Vec<Entity> {
    entities
        .into_iter()
        .filter(|e| e.extractor.as_deref() != Some(CLASSIFIER_EXTRACTOR))
        .collect()
}

pub fn count_kind(entities: &[Entity], kind: EntityKind) -> usize {
    entities.iter().filter(|e| e.kind == kind).count()
}
