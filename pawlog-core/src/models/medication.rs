use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::entity::{now, Entity};
use crate::codec::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    Weekly,
    Monthly,
    AsNeeded,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::OnceDaily => write!(f, "once_daily"),
            Frequency::TwiceDaily => write!(f, "twice_daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::AsNeeded => write!(f, "as_needed"),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "once_daily" | "daily" => Ok(Frequency::OnceDaily),
            "twice_daily" => Ok(Frequency::TwiceDaily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "as_needed" => Ok(Frequency::AsNeeded),
            _ => Err(format!("Invalid frequency '{}'", s)),
        }
    }
}

/// A course of medication for one pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Open-ended when absent.
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub schedule: Vec<NaiveTime>,
    pub remaining_doses: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Medication {
    pub fn new(
        owner_id: impl Into<String>,
        pet_id: impl Into<String>,
        name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        let now = now();
        Self {
            id: String::new(),
            owner_id: owner_id.into(),
            pet_id: pet_id.into(),
            name: name.into(),
            dosage: dosage.into(),
            frequency,
            start_date,
            end_date: None,
            schedule: Vec::new(),
            remaining_doses: None,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_schedule(mut self, schedule: Vec<NaiveTime>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_remaining_doses(mut self, doses: u32) -> Self {
        self.remaining_doses = Some(doses);
        self
    }

    /// Whether the course covers `date` (both ends inclusive).
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| date <= end)
    }
}

impl Entity for Medication {
    const COLLECTION: &'static str = "medications";
    const KIND: &'static str = "medication";
    const FIELDS: &'static [Field] = &[
        Field::plain("id"),
        Field::plain("ownerId"),
        Field::plain("petId"),
        Field::plain("name"),
        Field::plain("dosage"),
        Field::plain("frequency"),
        Field::date("startDate"),
        Field::date("endDate"),
        Field::json("schedule"),
        Field::plain("remainingDoses"),
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

impl fmt::Display for Medication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.dosage, self.frequency)?;
        if let Some(doses) = self.remaining_doses {
            write!(f, ", {} doses left", doses)?;
        }
        Ok(())
    }
}
