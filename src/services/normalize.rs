use std::collections::{HashMap, HashSet};

use crate::models::vocabulary::SynonymTable;
use crate::models::{Size, Temperature, Vocabulary};

pub const NUMERAL_WORDS: [&str; 10] = [
    "한", "두", "세", "네", "다섯", "여섯", "일곱", "여덟", "아홉", "열",
];

/// Maps "한".."열" to 1..10. Anything else counts as one cup.
pub fn quantity_to_int(word: &str) -> u32 {
    NUMERAL_WORDS
        .iter()
        .position(|w| *w == word)
        .map(|i| i as u32 + 1)
        .unwrap_or(1)
}

/// Maps 1..10 to its numeral word. Other numbers render as decimal strings.
pub fn int_to_quantity_word(n: u32) -> String {
    match n {
        1..=10 => NUMERAL_WORDS[n as usize - 1].to_string(),
        _ => n.to_string(),
    }
}

fn reverse_table(table: &SynonymTable) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (canonical, variants) in table {
        map.insert(canonical.clone(), canonical.clone());
        for variant in variants {
            map.insert(variant.clone(), canonical.clone());
        }
    }
    map
}

fn lookup(map: &HashMap<String, String>, raw: &str) -> String {
    map.get(raw).cloned().unwrap_or_else(|| raw.to_string())
}

/// Canonicalizes raw entity values. Every lookup is total: unknown input comes back unchanged.
#[derive(Debug, Clone)]
pub struct Normalizer {
    drinks: HashMap<String, String>,
    temperatures: HashMap<String, String>,
    sizes: HashMap<String, String>,
    quantities: HashMap<String, String>,
    options: HashMap<String, String>,
    takeout: HashMap<String, String>,
    dining_modes: Vec<String>,
    shorthands: HashMap<String, (String, Temperature)>,
    hot_only: HashSet<String>,
    ice_only: HashSet<String>,
    particles: Vec<String>,
    contrast_markers: Vec<String>,
    recommendations: Vec<String>,
}

impl Normalizer {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        let mut shorthands = HashMap::new();
        for shorthand in &vocabulary.shorthands {
            for word in &shorthand.words {
                shorthands.insert(
                    word.clone(),
                    (shorthand.drink.clone(), shorthand.temperature),
                );
            }
        }

        Self {
            drinks: reverse_table(&vocabulary.drinks),
            temperatures: reverse_table(&vocabulary.temperatures),
            sizes: reverse_table(&vocabulary.sizes),
            quantities: reverse_table(&vocabulary.quantities),
            options: reverse_table(&vocabulary.options),
            takeout: reverse_table(&vocabulary.takeout),
            dining_modes: vocabulary.takeout.keys().cloned().collect(),
            shorthands,
            hot_only: vocabulary.hot_only.iter().cloned().collect(),
            ice_only: vocabulary.ice_only.iter().cloned().collect(),
            particles: vocabulary.particles.clone(),
            contrast_markers: vocabulary.contrast_markers.clone(),
            recommendations: vocabulary.recommendations.clone(),
        }
    }

    /// Drops whitespace and commas, then maps known misspellings.
    pub fn normalize_drink(&self, raw: &str) -> String {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();
        lookup(&self.drinks, &compact)
    }

    pub fn normalize_temperature(&self, raw: &str) -> String {
        lookup(&self.temperatures, raw)
    }

    pub fn normalize_size(&self, raw: &str) -> String {
        lookup(&self.sizes, raw)
    }

    pub fn normalize_quantity(&self, raw: &str) -> String {
        lookup(&self.quantities, raw)
    }

    /// Option words also go through the drink table.
    pub fn normalize_option(&self, raw: &str) -> String {
        self.normalize_drink(&lookup(&self.options, raw))
    }

    pub fn normalize_take(&self, raw: &str) -> String {
        lookup(&self.takeout, raw)
    }

    /// "포장" or "매장" for a recognized takeout word.
    pub fn dining_mode(&self, raw: &str) -> Option<String> {
        let mode = self.normalize_take(&self.strip_particle(raw.trim()));
        self.dining_modes.contains(&mode).then_some(mode)
    }

    /// None when the word is not a known temperature.
    pub fn temperature(&self, raw: &str) -> Option<Temperature> {
        Temperature::parse(&self.normalize_temperature(raw))
    }

    pub fn size(&self, raw: &str) -> Option<Size> {
        Size::parse(&self.normalize_size(raw))
    }

    /// Digit strings are taken literally. Zero is kept so the caller can default it.
    pub fn quantity(&self, raw: &str) -> u32 {
        let word = self.normalize_quantity(raw.trim());
        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            return word.parse().unwrap_or(1);
        }
        quantity_to_int(&word)
    }

    /// Colloquial drink words that carry their own temperature.
    pub fn shorthand(&self, raw: &str) -> Option<(&str, Temperature)> {
        self.shorthands
            .get(raw.trim())
            .map(|(drink, temperature)| (drink.as_str(), *temperature))
    }

    pub fn fixed_temperature(&self, drink: &str) -> Option<Temperature> {
        if self.hot_only.contains(drink) {
            Some(Temperature::Hot)
        } else if self.ice_only.contains(drink) {
            Some(Temperature::Ice)
        } else {
            None
        }
    }

    /// Removes the first matching trailing particle. A value is never reduced to nothing.
    pub fn strip_particle(&self, value: &str) -> String {
        for particle in &self.particles {
            if let Some(stem) = value.strip_suffix(particle.as_str()) {
                let stem = stem.trim();
                if stem.is_empty() {
                    break;
                }
                return stem.to_string();
            }
        }
        value.to_string()
    }

    pub fn contrast_markers(&self) -> &[String] {
        &self.contrast_markers
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }
}
