use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::entity::{now, Entity};
use super::meal_type::MealType;
use crate::codec::Field;

/// One portion served as part of a meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealItem {
    pub food_item_id: Option<String>,
    pub name: String,
    pub grams: f64,
}

impl MealItem {
    pub fn new(name: impl Into<String>, grams: f64) -> Self {
        Self {
            food_item_id: None,
            name: name.into(),
            grams,
        }
    }

    pub fn from_food(food_item_id: impl Into<String>, name: impl Into<String>, grams: f64) -> Self {
        Self {
            food_item_id: Some(food_item_id.into()),
            name: name.into(),
            grams,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    pub meal_type: MealType,
    pub fed_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<MealItem>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meal {
    pub fn new(
        owner_id: impl Into<String>,
        pet_id: impl Into<String>,
        meal_type: MealType,
        fed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            owner_id: owner_id.into(),
            pet_id: pet_id.into(),
            meal_type,
            fed_at,
            items: Vec::new(),
            notes: None,
            created_at: now(),
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_item(mut self, item: MealItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn total_grams(&self) -> f64 {
        self.items.iter().map(|item| item.grams).sum()
    }
}

impl Entity for Meal {
    const COLLECTION: &'static str = "meals";
    const KIND: &'static str = "meal";
    const FIELDS: &'static [Field] = &[
        Field::plain("id"),
        Field::plain("ownerId"),
        Field::plain("petId"),
        Field::plain("mealType"),
        Field::timestamp("fedAt"),
        Field::json("items"),
        Field::plain("notes"),
        Field::timestamp("createdAt"),
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

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {} ({}g)",
            self.meal_type,
            self.fed_at.format("%Y-%m-%d %H:%M"),
            self.total_grams()
        )
    }
}
