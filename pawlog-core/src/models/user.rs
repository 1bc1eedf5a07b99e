use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::{now, Entity};
use crate::codec::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub weight_unit: WeightUnit,
    pub timezone: Option<String>,
    #[serde(default = "default_true")]
    pub reminders_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            weight_unit: WeightUnit::Kg,
            timezone: None,
            reminders_enabled: true,
        }
    }
}

/// An account. Users own themselves: the owner key is the `id` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            email: email.into(),
            display_name: display_name.into(),
            preferences: UserPreferences::default(),
            last_login_at: None,
            created_at: now(),
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const KIND: &'static str = "user";
    const OWNER_KEY: &'static str = "id";
    const FIELDS: &'static [Field] = &[
        Field::plain("id"),
        Field::plain("email"),
        Field::plain("displayName"),
        Field::json("preferences"),
        Field::timestamp("lastLoginAt"),
        Field::timestamp("createdAt"),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn owner_id(&self) -> &str {
        &self.id
    }
}
