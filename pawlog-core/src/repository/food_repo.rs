use super::{Repository, RepositoryError};
use crate::models::{FoodCategory, FoodItem};

impl Repository<FoodItem> {
    pub async fn find_by_category(
        &self,
        owner_id: &str,
        category: FoodCategory,
    ) -> Result<Vec<FoodItem>, RepositoryError> {
        self.find(|f| f.owner_id == owner_id && f.category == category)
            .await
    }

    /// Items whose stock is at or below their low-stock threshold.
    pub async fn get_low_stock(&self, owner_id: &str) -> Result<Vec<FoodItem>, RepositoryError> {
        self.find(|f| f.owner_id == owner_id && f.is_low_stock()).await
    }
}
