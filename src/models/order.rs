use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Temperature {
    #[serde(rename = "핫")]
    Hot,
    #[serde(rename = "아이스")]
    Ice,
}

impl Temperature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Hot => "핫",
            Temperature::Ice => "아이스",
        }
    }

    /// Parses a canonical token only. Surface words go through the normalizer first.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "핫" => Some(Temperature::Hot),
            "아이스" => Some(Temperature::Ice),
            _ => None,
        }
    }

    /// The token followed by its instrumental particle, as used in prompts.
    pub fn with_particle(&self) -> &'static str {
        match self {
            Temperature::Hot => "핫으로",
            Temperature::Ice => "아이스로",
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Size {
    #[serde(rename = "미디움")]
    Medium,
    #[serde(rename = "라지")]
    Large,
    #[serde(rename = "엑스라지")]
    XLarge,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Medium => "미디움",
            Size::Large => "라지",
            Size::XLarge => "엑스라지",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "미디움" => Some(Size::Medium),
            "라지" => Some(Size::Large),
            "엑스라지" => Some(Size::XLarge),
            _ => None,
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered set of canonical option names.
///
/// Equality ignores order: two sets are equal when they hold the same names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet(Vec<String>);

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Parses the comma-joined display form.
    pub fn parse(joined: &str) -> Self {
        Self::from_names(joined.split(','))
    }

    /// Returns false for blanks and names already present.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|n| n != name);
        self.0.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn union(&self, other: &OptionSet) -> OptionSet {
        let mut merged = self.clone();
        for name in other.iter() {
            merged.insert(name);
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for OptionSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|n| other.contains(n))
    }
}

impl Eq for OptionSet {}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// One physical cup in the cart. The drink name is the cart key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub temperature: Temperature,
    pub size: Size,
    pub options: OptionSet,
}

impl CartLine {
    pub fn matches(&self, temperature: Temperature, size: Size, options: &OptionSet) -> bool {
        self.temperature == temperature && self.size == size && &self.options == options
    }
}

/// A finalized order line produced by segmentation. May stand for several identical cups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub drink: String,
    pub temperature: Temperature,
    /// Temperature the speaker actually stated, before fixed-temperature enforcement.
    pub requested_temperature: Option<Temperature>,
    pub size: Size,
    pub quantity: u32,
    /// Canonical option names in mention order. Repeats are kept.
    pub options: Vec<String>,
}

impl OrderLine {
    pub fn option_set(&self) -> OptionSet {
        OptionSet::from_names(&self.options)
    }

    pub fn joined_options(&self) -> String {
        self.options.join(", ")
    }
}

/// Column-wise view of a segmentation: one entry per order line in every sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappedOrders {
    pub temperatures: Vec<Temperature>,
    pub drink_types: Vec<String>,
    pub sizes: Vec<Size>,
    pub quantities: Vec<u32>,
    pub additional_options: Vec<String>,
}

impl MappedOrders {
    pub fn from_lines(lines: &[OrderLine]) -> Self {
        let mut mapped = Self::default();
        for line in lines {
            mapped.temperatures.push(line.temperature);
            mapped.drink_types.push(line.drink.clone());
            mapped.sizes.push(line.size);
            mapped.quantities.push(line.quantity);
            mapped.additional_options.push(line.joined_options());
        }
        mapped
    }

    pub fn len(&self) -> usize {
        self.drink_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drink_types.is_empty()
    }
}
