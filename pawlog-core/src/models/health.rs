use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::entity::{now, Entity};
use crate::codec::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthRecordType {
    Vaccination,
    Checkup,
    Illness,
    Injury,
    Surgery,
    Dental,
    Other,
}

impl fmt::Display for HealthRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthRecordType::Vaccination => write!(f, "vaccination"),
            HealthRecordType::Checkup => write!(f, "checkup"),
            HealthRecordType::Illness => write!(f, "illness"),
            HealthRecordType::Injury => write!(f, "injury"),
            HealthRecordType::Surgery => write!(f, "surgery"),
            HealthRecordType::Dental => write!(f, "dental"),
            HealthRecordType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for HealthRecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vaccination" => Ok(HealthRecordType::Vaccination),
            "checkup" => Ok(HealthRecordType::Checkup),
            "illness" => Ok(HealthRecordType::Illness),
            "injury" => Ok(HealthRecordType::Injury),
            "surgery" => Ok(HealthRecordType::Surgery),
            "dental" => Ok(HealthRecordType::Dental),
            "other" => Ok(HealthRecordType::Other),
            _ => Err(format!("Invalid health record type '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub name: String,
    pub clinic: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub mime_type: Option<String>,
}

/// A vet visit, vaccination or other health event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    pub record_type: HealthRecordType,
    pub title: String,
    pub date: DateTime<Utc>,
    pub provider: Option<ProviderInfo>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub needs_follow_up: bool,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HealthRecord {
    pub fn new(
        owner_id: impl Into<String>,
        pet_id: impl Into<String>,
        record_type: HealthRecordType,
        title: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        let now = now();
        Self {
            id: String::new(),
            owner_id: owner_id.into(),
            pet_id: pet_id.into(),
            record_type,
            title: title.into(),
            date,
            provider: None,
            attachments: Vec::new(),
            needs_follow_up: false,
            follow_up_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_provider(mut self, provider: ProviderInfo) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Flags the record for a follow-up visit on `date`.
    pub fn with_follow_up(mut self, date: DateTime<Utc>) -> Self {
        self.needs_follow_up = true;
        self.follow_up_date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl Entity for HealthRecord {
    const COLLECTION: &'static str = "health_records";
    const KIND: &'static str = "health_record";
    const FIELDS: &'static [Field] = &[
        Field::plain("id"),
        Field::plain("ownerId"),
        Field::plain("petId"),
        Field::plain("recordType"),
        Field::plain("title"),
        Field::timestamp("date"),
        Field::json("provider"),
        Field::json("attachments"),
        Field::plain("needsFollowUp"),
        Field::timestamp("followUpDate"),
        Field::plain("notes"),
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

impl fmt::Display for HealthRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.title, self.record_type)?;
        writeln!(f, "Date: {}", self.date.format("%Y-%m-%d"))?;
        if let Some(provider) = &self.provider {
            writeln!(f, "Provider: {}", provider.name)?;
        }
        if let Some(follow_up) = self.follow_up_date.filter(|_| self.needs_follow_up) {
            writeln!(f, "Follow-up: {}", follow_up.format("%Y-%m-%d"))?;
        }
        Ok(())
    }
}
