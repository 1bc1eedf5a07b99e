use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::entity::{now, Entity};
use super::nutrient::Nutrient;
use crate::codec::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    DryFood,
    WetFood,
    Treat,
    Supplement,
    Other,
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodCategory::DryFood => write!(f, "dry_food"),
            FoodCategory::WetFood => write!(f, "wet_food"),
            FoodCategory::Treat => write!(f, "treat"),
            FoodCategory::Supplement => write!(f, "supplement"),
            FoodCategory::Other => write!(f, "other"),
        }
    }
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "dry_food" | "dry" => Ok(FoodCategory::DryFood),
            "wet_food" | "wet" => Ok(FoodCategory::WetFood),
            "treat" => Ok(FoodCategory::Treat),
            "supplement" => Ok(FoodCategory::Supplement),
            "other" => Ok(FoodCategory::Other),
            _ => Err(format!(
                "Invalid food category '{}'. Valid options: dry_food, wet_food, treat, supplement, other",
                s
            )),
        }
    }
}

/// A food product in the household pantry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: FoodCategory,
    pub calories_per_100g: Option<f64>,
    pub stock_grams: f64,
    pub low_stock_threshold_grams: f64,
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FoodItem {
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>, category: FoodCategory) -> Self {
        let now = now();
        Self {
            id: String::new(),
            owner_id: owner_id.into(),
            name: name.into(),
            brand: None,
            category,
            calories_per_100g: None,
            stock_grams: 0.0,
            low_stock_threshold_grams: 0.0,
            nutrients: Vec::new(),
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_calories_per_100g(mut self, calories: f64) -> Self {
        self.calories_per_100g = Some(calories);
        self
    }

    pub fn with_stock(mut self, stock_grams: f64, low_stock_threshold_grams: f64) -> Self {
        self.stock_grams = stock_grams;
        self.low_stock_threshold_grams = low_stock_threshold_grams;
        self
    }

    pub fn with_nutrient(mut self, nutrient: Nutrient) -> Self {
        self.nutrients.push(nutrient);
        self
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_grams <= self.low_stock_threshold_grams
    }
}

impl Entity for FoodItem {
    const COLLECTION: &'static str = "food_items";
    const KIND: &'static str = "food_item";
    const FIELDS: &'static [Field] = &[
        Field::plain("id"),
        Field::plain("ownerId"),
        Field::plain("name"),
        Field::plain("brand"),
        Field::plain("category"),
        Field::plain("caloriesPer100g"),
        Field::plain("stockGrams"),
        Field::plain("lowStockThresholdGrams"),
        Field::json("nutrients"),
        Field::timestamp("createdAt"),
        Field::timestamp("updatedAt"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl fmt::Display for FoodItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.brand {
            Some(brand) => write!(f, "{} ({})", self.name, brand)?,
            None => write!(f, "{}", self.name)?,
        }
        write!(f, " [{}] {}g in stock", self.category, self.stock_grams)
    }
}
