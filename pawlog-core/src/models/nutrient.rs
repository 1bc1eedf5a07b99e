use serde::{Deserialize, Serialize};
use std::fmt;

/// A nutrient amount per 100 g of a food item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nutrient {
    pub name: String,
    pub per_100g: f64,
    pub unit: String,
}

impl Nutrient {
    pub fn new(name: impl Into<String>, per_100g: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            per_100g,
            unit: unit.into(),
        }
    }

    /// Amount contained in `grams` of the food.
    pub fn amount_in(&self, grams: f64) -> f64 {
        self.per_100g * grams / 100.0
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}/100g", self.name, self.per_100g, self.unit)
    }
}
