use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When in the day a pet was fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Treat,
    Supplement,
}

impl MealType {
    pub const ALL: [MealType; 5] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Treat,
        MealType::Supplement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Treat => "treat",
            MealType::Supplement => "supplement",
        }
    }

    /// Treats and supplements are logged but not counted as a regular feeding.
    pub fn is_regular(&self) -> bool {
        matches!(self, MealType::Breakfast | MealType::Lunch | MealType::Dinner)
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MealType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = MealType::ALL.iter().map(MealType::as_str).collect();
                format!("Unknown meal type '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
