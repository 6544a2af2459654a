use std::sync::Arc;

use serde::Serialize;

use crate::errors::OrderError;
use crate::models::{CartLine, OptionSet, Size, Temperature};
use crate::services::normalize::{int_to_quantity_word, Normalizer};

#[derive(Debug, Clone)]
struct CartEntry {
    drink: String,
    cups: Vec<CartLine>,
}

/// Identical cups of one drink, in the order the combination first appeared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartGroup {
    pub drink: String,
    pub temperature: Temperature,
    pub size: Size,
    pub options: OptionSet,
    pub count: u32,
}

impl CartGroup {
    pub fn describe(&self) -> String {
        let mut text = format!("{} {} {}", self.temperature, self.drink, self.size);
        if !self.options.is_empty() {
            text.push_str(&format!(" {} 추가", self.options));
        }
        text.push_str(&format!(" {} 잔", int_to_quantity_word(self.count)));
        text
    }
}

/// The running order of one session: cups grouped by canonical drink name, drinks in the
/// order they were first added.
#[derive(Debug, Clone)]
pub struct Cart {
    normalizer: Arc<Normalizer>,
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new(normalizer: Arc<Normalizer>) -> Self {
        Self {
            normalizer,
            entries: Vec::new(),
        }
    }

    pub fn normalizer(&self) -> Arc<Normalizer> {
        Arc::clone(&self.normalizer)
    }

    fn position(&self, drink: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.drink == drink)
    }

    /// Indices of up to `limit` cups satisfying `pred`, in stored order.
    fn matching_cups(
        &self,
        entry: usize,
        limit: u32,
        pred: impl Fn(&CartLine) -> bool,
    ) -> Vec<usize> {
        self.entries[entry]
            .cups
            .iter()
            .enumerate()
            .filter(|(_, cup)| pred(cup))
            .map(|(i, _)| i)
            .take(limit as usize)
            .collect()
    }

    pub fn add(
        &mut self,
        drink: &str,
        quantity: u32,
        temperature: Temperature,
        size: Size,
        options: &OptionSet,
    ) {
        let drink = self.normalizer.normalize_drink(drink);
        let cup = CartLine {
            temperature,
            size,
            options: options.clone(),
        };
        let idx = match self.position(&drink) {
            Some(idx) => idx,
            None => {
                self.entries.push(CartEntry {
                    drink,
                    cups: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[idx];
        entry
            .cups
            .extend(std::iter::repeat(cup).take(quantity as usize));
        if entry.cups.is_empty() {
            self.entries.remove(idx);
        }
    }

    /// Removes `quantity` cups (one when absent) that exactly match. Nothing changes on failure.
    pub fn subtract(
        &mut self,
        drink: &str,
        quantity: Option<u32>,
        temperature: Temperature,
        size: Size,
        options: &OptionSet,
    ) -> Result<(), OrderError> {
        let drink = self.normalizer.normalize_drink(drink);
        let idx = self
            .position(&drink)
            .ok_or_else(|| OrderError::NotInCart {
                drink: drink.clone(),
            })?;
        let wanted = quantity.unwrap_or(1);

        let matched =
            self.matching_cups(idx, wanted, |cup| cup.matches(temperature, size, options));
        if (matched.len() as u32) < wanted {
            return Err(OrderError::InsufficientQuantity { drink });
        }

        let cups = &mut self.entries[idx].cups;
        for i in matched.into_iter().rev() {
            cups.remove(i);
        }
        if cups.is_empty() {
            self.entries.remove(idx);
        }
        Ok(())
    }

    /// Adds `new_options` to cups whose options equal `current`. When fewer than `quantity`
    /// such cups exist, `quantity` new cups carrying only `new_options` are added instead.
    pub fn add_additional_options(
        &mut self,
        drink: &str,
        quantity: u32,
        temperature: Temperature,
        size: Size,
        current: &OptionSet,
        new_options: &OptionSet,
    ) {
        let drink = self.normalizer.normalize_drink(drink);
        let Some(idx) = self.position(&drink) else {
            self.add(&drink, quantity, temperature, size, new_options);
            return;
        };

        let matched =
            self.matching_cups(idx, quantity, |cup| cup.matches(temperature, size, current));
        if (matched.len() as u32) < quantity {
            tracing::debug!(drink = %drink, matched = matched.len(), quantity, "option target not found, adding new cups");
            self.add(&drink, quantity, temperature, size, new_options);
            return;
        }

        let cups = &mut self.entries[idx].cups;
        for i in matched {
            cups[i].options = cups[i].options.union(new_options);
        }
    }

    /// Removes `option` from cups whose options equal `current`. Nothing changes on failure.
    pub fn remove_additional_options(
        &mut self,
        drink: &str,
        quantity: u32,
        temperature: Temperature,
        size: Size,
        current: &OptionSet,
        option: &str,
    ) -> Result<(), OrderError> {
        let drink = self.normalizer.normalize_drink(drink);
        let idx = self
            .position(&drink)
            .ok_or_else(|| OrderError::NotInCart {
                drink: drink.clone(),
            })?;

        let matched =
            self.matching_cups(idx, quantity, |cup| cup.matches(temperature, size, current));
        if (matched.len() as u32) < quantity {
            return Err(OrderError::InsufficientQuantity { drink });
        }

        let cups = &mut self.entries[idx].cups;
        for i in matched {
            cups[i].options.remove(option);
        }
        Ok(())
    }

    /// Subtracts `old` when present, then adds `new`. The subtraction is not undone.
    pub fn modify(
        &mut self,
        old: &str,
        new: &str,
        quantity: u32,
        temperature: Temperature,
        size: Size,
        options: &OptionSet,
    ) -> Result<(), OrderError> {
        if self.contains(old) {
            self.subtract(old, Some(quantity), temperature, size, options)?;
        }
        self.add(new, quantity, temperature, size, options);
        Ok(())
    }

    /// Empties the cart and returns what it held as (drink, count) pairs.
    pub fn cancel(&mut self) -> Vec<(String, u32)> {
        let canceled = self.orders();
        self.entries.clear();
        canceled
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drink counts in insertion order.
    pub fn orders(&self) -> Vec<(String, u32)> {
        self.entries
            .iter()
            .map(|e| (e.drink.clone(), e.cups.len() as u32))
            .collect()
    }

    pub fn contains(&self, drink: &str) -> bool {
        self.position(&self.normalizer.normalize_drink(drink))
            .is_some()
    }

    pub fn count(&self, drink: &str) -> u32 {
        self.position(&self.normalizer.normalize_drink(drink))
            .map(|i| self.entries[i].cups.len() as u32)
            .unwrap_or(0)
    }

    pub fn cups(&self, drink: &str) -> &[CartLine] {
        self.position(&self.normalizer.normalize_drink(drink))
            .map(|i| self.entries[i].cups.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_cups(&self) -> u32 {
        self.entries.iter().map(|e| e.cups.len() as u32).sum()
    }

    pub fn grouped(&self) -> Vec<CartGroup> {
        let mut groups: Vec<CartGroup> = Vec::new();
        for entry in &self.entries {
            let first = groups.len();
            for cup in &entry.cups {
                match groups[first..]
                    .iter_mut()
                    .find(|g| cup.matches(g.temperature, g.size, &g.options))
                {
                    Some(group) => group.count += 1,
                    None => groups.push(CartGroup {
                        drink: entry.drink.clone(),
                        temperature: cup.temperature,
                        size: cup.size,
                        options: cup.options.clone(),
                        count: 1,
                    }),
                }
            }
        }
        groups
    }

    /// e.g. "아이스 아메리카노 라지 샷 추가 두 잔, 핫 카페라떼 미디움 한 잔"
    pub fn summary(&self) -> String {
        self.grouped()
            .iter()
            .map(CartGroup::describe)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
