use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::entity::{now, Entity};
use crate::codec::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Dog,
    Cat,
    Bird,
    Rabbit,
    Reptile,
    Fish,
    Other,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Species::Dog => "dog",
            Species::Cat => "cat",
            Species::Bird => "bird",
            Species::Rabbit => "rabbit",
            Species::Reptile => "reptile",
            Species::Fish => "fish",
            Species::Other => "other",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Species {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dog" => Ok(Species::Dog),
            "cat" => Ok(Species::Cat),
            "bird" => Ok(Species::Bird),
            "rabbit" => Ok(Species::Rabbit),
            "reptile" => Ok(Species::Reptile),
            "fish" => Ok(Species::Fish),
            "other" => Ok(Species::Other),
            _ => Err(format!(
                "Invalid species '{}'. Valid options: dog, cat, bird, rabbit, reptile, fish, other",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VetContact {
    pub name: String,
    pub phone: Option<String>,
    pub clinic: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: Species,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
    pub microchip_id: Option<String>,
    pub vet: Option<VetContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Fields written by newer clients or the server that this build does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pet {
    /// Creates a pet with an empty id; `Repository::create` assigns one.
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>, species: Species) -> Self {
        let now = now();
        Self {
            id: String::new(),
            owner_id: owner_id.into(),
            name: name.into(),
            species,
            breed: None,
            birth_date: None,
            weight_kg: None,
            microchip_id: None,
            vet: None,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Some(breed.into());
        self
    }

    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn with_weight_kg(mut self, weight_kg: f64) -> Self {
        self.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_vet(mut self, vet: VetContact) -> Self {
        self.vet = Some(vet);
        self
    }
}

impl Entity for Pet {
    const COLLECTION: &'static str = "pets";
    const KIND: &'static str = "pet";
    const FIELDS: &'static [Field] = &[
        Field::plain("id"),
        Field::plain("ownerId"),
        Field::plain("name"),
        Field::plain("species"),
        Field::plain("breed"),
        Field::date("birthDate"),
        Field::plain("weightKg"),
        Field::plain("microchipId"),
        Field::json("vet"),
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

impl fmt::Display for Pet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.name, self.species)?;
        if let Some(breed) = &self.breed {
            write!(f, ", {}", breed)?;
        }
        write!(f, ")")
    }
}
