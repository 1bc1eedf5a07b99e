use chrono::NaiveDate;

use super::{Repository, RepositoryError};
use crate::models::Medication;

impl Repository<Medication> {
    pub async fn find_by_pet(&self, pet_id: &str) -> Result<Vec<Medication>, RepositoryError> {
        self.find(|m| m.pet_id == pet_id).await
    }

    pub async fn get_active_on(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Medication>, RepositoryError> {
        self.find(|m| m.owner_id == owner_id && m.is_active_on(date))
            .await
    }

    /// Courses with a tracked dose count at or below `min_doses`.
    pub async fn get_needing_refill(
        &self,
        owner_id: &str,
        min_doses: u32,
    ) -> Result<Vec<Medication>, RepositoryError> {
        self.find(|m| {
            m.owner_id == owner_id && m.remaining_doses.map_or(false, |left| left <= min_doses)
        })
        .await
    }
}
