use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::{Size, Temperature};

static BUILTIN_VOCABULARY: &str = include_str!("../../data/vocabulary.json");

/// Canonical token to the surface variants that map onto it.
pub type SynonymTable = BTreeMap<String, Vec<String>>;

/// A colloquial drink word that also fixes the temperature ("아아" is an iced americano).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shorthand {
    pub words: Vec<String>,
    pub drink: String,
    pub temperature: Temperature,
}

/// Swappable lookup data behind the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(default)]
    pub drinks: SynonymTable,
    #[serde(default)]
    pub temperatures: SynonymTable,
    #[serde(default)]
    pub sizes: SynonymTable,
    #[serde(default)]
    pub quantities: SynonymTable,
    #[serde(default)]
    pub options: SynonymTable,
    #[serde(default)]
    pub takeout: SynonymTable,
    #[serde(default)]
    pub shorthands: Vec<Shorthand>,
    #[serde(default)]
    pub hot_only: Vec<String>,
    #[serde(default)]
    pub ice_only: Vec<String>,
    #[serde(default)]
    pub particles: Vec<String>,
    #[serde(default)]
    pub contrast_markers: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Vocabulary {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_VOCABULARY).context("built-in vocabulary is invalid")
    }

    /// Reads a vocabulary file, or the built-in tables when no path is given.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read vocabulary file: {path}"))?;
                Self::from_json(&raw).with_context(|| format!("invalid vocabulary file: {path}"))
            }
            None => Self::builtin(),
        }
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let vocabulary: Vocabulary = serde_json::from_str(s)?;
        for canonical in vocabulary.temperatures.keys() {
            anyhow::ensure!(
                Temperature::parse(canonical).is_some(),
                "unknown canonical temperature: {canonical}"
            );
        }
        for canonical in vocabulary.sizes.keys() {
            anyhow::ensure!(
                Size::parse(canonical).is_some(),
                "unknown canonical size: {canonical}"
            );
        }
        for drink in vocabulary.hot_only.iter() {
            anyhow::ensure!(
                !vocabulary.ice_only.contains(drink),
                "{drink} cannot be both hot-only and ice-only"
            );
        }
        Ok(vocabulary)
    }
}
