use chrono::{DateTime, NaiveDate, Utc};

use super::{Repository, RepositoryError};
use crate::models::{Meal, MealType};

impl Repository<Meal> {
    pub async fn find_by_pet(&self, pet_id: &str) -> Result<Vec<Meal>, RepositoryError> {
        self.find(|m| m.pet_id == pet_id).await
    }

    /// Meals fed on `date` (UTC calendar day).
    pub async fn find_for_day(&self, owner_id: &str, date: NaiveDate) -> Result<Vec<Meal>, RepositoryError> {
        self.find(|m| m.owner_id == owner_id && m.fed_at.date_naive() == date)
            .await
    }

    /// Meals fed in `[from, to)`.
    pub async fn find_in_range(
        &self,
        owner_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Meal>, RepositoryError> {
        self.find(|m| m.owner_id == owner_id && m.fed_at >= from && m.fed_at < to)
            .await
    }

    pub async fn find_by_meal_type(
        &self,
        owner_id: &str,
        meal_type: MealType,
    ) -> Result<Vec<Meal>, RepositoryError> {
        self.find(|m| m.owner_id == owner_id && m.meal_type == meal_type)
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Meal, MealItem, MealType};
    use crate::remote::OfflineRemoteStore;
    use crate::repository::Repository;
    use crate::store::LocalStore;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Arc;

    async fn seeded() -> Repository<Meal> {
        let repo: Repository<Meal> = Repository::new(LocalStore::in_memory(), Arc::new(OfflineRemoteStore));
        for (id, pet, meal_type, day, hour) in [
            ("m1", "rex", MealType::Breakfast, 1, 7),
            ("m2", "rex", MealType::Dinner, 1, 18),
            ("m3", "mochi", MealType::Treat, 1, 23),
            ("m4", "rex", MealType::Breakfast, 2, 0),
        ] {
            let fed_at = Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap();
            repo.create(
                Meal::new("o", pet, meal_type, fed_at)
                    .with_id(id)
                    .with_item(MealItem::new("Kibble", 100.0)),
            )
            .await
            .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_find_for_day() {
        let repo = seeded().await;
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let meals = repo.find_for_day("o", day).await.unwrap();
        let ids: Vec<&str> = meals.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_find_by_meal_type_and_pet() {
        let repo = seeded().await;
        assert_eq!(repo.find_by_meal_type("o", MealType::Breakfast).await.unwrap().len(), 2);
        assert!(repo.find_by_meal_type("o", MealType::Lunch).await.unwrap().is_empty());
        assert_eq!(repo.find_by_pet("mochi").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_in_range() {
        let repo = seeded().await;
        let from = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let ids: Vec<String> = repo
            .find_in_range("o", from, to)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m2", "m3"]);
    }
}
