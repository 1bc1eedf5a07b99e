mod activity;
mod entity;
mod food;
mod health;
mod meal;
mod meal_type;
mod medication;
mod nutrient;
mod pet;
mod user;

pub use activity::{ActivityKind, ActivitySession, GeoPoint};
pub use entity::{new_id, now, Entity};
pub use food::{FoodCategory, FoodItem};
pub use health::{Attachment, HealthRecord, HealthRecordType, ProviderInfo};
pub use meal::{Meal, MealItem};
pub use meal_type::MealType;
pub use medication::{Frequency, Medication};
pub use nutrient::Nutrient;
pub use pet::{Address, Pet, Species, VetContact};
pub use user::{User, UserPreferences, WeightUnit};
