use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::entity::{now, Entity};
use crate::codec::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Walk,
    Run,
    Play,
    Training,
    Swim,
    Other,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Walk => write!(f, "walk"),
            ActivityKind::Run => write!(f, "run"),
            ActivityKind::Play => write!(f, "play"),
            ActivityKind::Training => write!(f, "training"),
            ActivityKind::Swim => write!(f, "swim"),
            ActivityKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "walk" => Ok(ActivityKind::Walk),
            "run" => Ok(ActivityKind::Run),
            "play" => Ok(ActivityKind::Play),
            "training" => Ok(ActivityKind::Training),
            "swim" => Ok(ActivityKind::Swim),
            "other" => Ok(ActivityKind::Other),
            _ => Err(format!(
                "Invalid activity '{}'. Valid options: walk, run, play, training, swim, other",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A recorded walk, run or play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySession {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    pub kind: ActivityKind,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub route: Vec<GeoPoint>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActivitySession {
    pub fn new(
        owner_id: impl Into<String>,
        pet_id: impl Into<String>,
        kind: ActivityKind,
        started_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: String::new(),
            owner_id: owner_id.into(),
            pet_id: pet_id.into(),
            kind,
            started_at,
            duration_minutes,
            distance_km: None,
            route: Vec::new(),
            notes: None,
            created_at: now(),
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_distance_km(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(distance_km);
        self
    }

    pub fn with_route(mut self, route: Vec<GeoPoint>) -> Self {
        self.route = route;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Entity for ActivitySession {
    const COLLECTION: &'static str = "activity_sessions";
    const KIND: &'static str = "activity_session";
    const FIELDS: &'static [Field] = &[
        Field::plain("id"),
        Field::plain("ownerId"),
        Field::plain("petId"),
        Field::plain("kind"),
        Field::timestamp("startedAt"),
        Field::plain("durationMinutes"),
        Field::plain("distanceKm"),
        Field::json("route"),
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
