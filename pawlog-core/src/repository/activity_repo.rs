use chrono::{DateTime, Utc};

use super::{Repository, RepositoryError};
use crate::models::ActivitySession;

impl Repository<ActivitySession> {
    /// The owner's latest `limit` sessions, newest first.
    pub async fn get_recent_by_owner(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivitySession>, RepositoryError> {
        let mut sessions = self.find_by_owner(owner_id).await?;
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    pub async fn find_by_pet(&self, pet_id: &str) -> Result<Vec<ActivitySession>, RepositoryError> {
        self.find(|s| s.pet_id == pet_id).await
    }

    /// Sessions started in `[from, to)`.
    pub async fn find_in_range(
        &self,
        owner_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ActivitySession>, RepositoryError> {
        self.find(|s| s.owner_id == owner_id && s.started_at >= from && s.started_at < to)
            .await
    }

    /// Total minutes of activity for a pet in `[from, to)`.
    pub async fn total_minutes_for_pet(
        &self,
        pet_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        Ok(self
            .find(|s| s.pet_id == pet_id && s.started_at >= from && s.started_at < to)
            .await?
            .iter()
            .map(|s| u64::from(s.duration_minutes))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{ActivityKind, ActivitySession};
    use crate::remote::OfflineRemoteStore;
    use crate::repository::Repository;
    use crate::store::LocalStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    async fn seeded() -> Repository<ActivitySession> {
        let repo: Repository<ActivitySession> = Repository::new(LocalStore::in_memory(), Arc::new(OfflineRemoteStore));
        for (id, pet, day, minutes) in [
            ("a1", "rex", 1, 30),
            ("a2", "rex", 3, 45),
            ("a3", "mochi", 2, 10),
            ("a4", "rex", 5, 60),
        ] {
            let started = Utc.with_ymd_and_hms(2025, 4, day, 8, 0, 0).unwrap();
            repo.create(
                ActivitySession::new("owner-1", pet, ActivityKind::Walk, started, minutes).with_id(id),
            )
            .await
            .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_get_recent_by_owner() {
        let repo = seeded().await;
        let recent = repo.get_recent_by_owner("owner-1", 2).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a4", "a2"]);

        assert!(repo.get_recent_by_owner("nobody", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_in_range_is_half_open() {
        let repo = seeded().await;
        let from = Utc.with_ymd_and_hms(2025, 4, 2, 8, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 4, 5, 8, 0, 0).unwrap();

        let found = repo.find_in_range("owner-1", from, to).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a3"]);
    }

    #[tokio::test]
    async fn test_total_minutes_for_pet() {
        let repo = seeded().await;
        let from = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap();

        assert_eq!(repo.total_minutes_for_pet("rex", from, to).await.unwrap(), 135);
        assert_eq!(repo.find_by_pet("mochi").await.unwrap().len(), 1);
    }
}
