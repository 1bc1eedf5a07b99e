use chrono::{DateTime, Duration, Utc};

use super::{Repository, RepositoryError};
use crate::models::{HealthRecord, HealthRecordType};

impl Repository<HealthRecord> {
    /// Flagged follow-ups due between now and `horizon_days` from now, soonest first.
    pub async fn get_upcoming_follow_ups(
        &self,
        owner_id: &str,
        horizon_days: i64,
    ) -> Result<Vec<HealthRecord>, RepositoryError> {
        self.get_upcoming_follow_ups_at(owner_id, horizon_days, Utc::now())
            .await
    }

    /// Like [`get_upcoming_follow_ups`](Self::get_upcoming_follow_ups) with an explicit clock.
    ///
    /// A negative horizon matches nothing; one past the calendar's end
    /// reaches as far as it can.
    pub async fn get_upcoming_follow_ups_at(
        &self,
        owner_id: &str,
        horizon_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<HealthRecord>, RepositoryError> {
        if horizon_days < 0 {
            return Ok(Vec::new());
        }
        let until = Duration::try_days(horizon_days)
            .and_then(|horizon| now.checked_add_signed(horizon))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut due = self
            .find(|r| {
                r.owner_id == owner_id
                    && r.needs_follow_up
                    && r.follow_up_date.map_or(false, |d| d >= now && d <= until)
            })
            .await?;
        due.sort_by_key(|r| r.follow_up_date);
        Ok(due)
    }

    pub async fn find_by_pet(&self, pet_id: &str) -> Result<Vec<HealthRecord>, RepositoryError> {
        self.find(|r| r.pet_id == pet_id).await
    }

    pub async fn find_by_type(
        &self,
        owner_id: &str,
        record_type: HealthRecordType,
    ) -> Result<Vec<HealthRecord>, RepositoryError> {
        self.find(|r| r.owner_id == owner_id && r.record_type == record_type)
            .await
    }

    /// Records dated in `[from, to)`.
    pub async fn find_in_range(
        &self,
        owner_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HealthRecord>, RepositoryError> {
        self.find(|r| r.owner_id == owner_id && r.date >= from && r.date < to)
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{HealthRecord, HealthRecordType};
    use crate::remote::OfflineRemoteStore;
    use crate::repository::Repository;
    use crate::store::LocalStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn at(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()
    }

    async fn seeded() -> Repository<HealthRecord> {
        let repo: Repository<HealthRecord> = Repository::new(LocalStore::in_memory(), Arc::new(OfflineRemoteStore));
        let records = vec![
            HealthRecord::new("o", "rex", HealthRecordType::Checkup, "Annual", at(1))
                .with_id("h1")
                .with_follow_up(at(20)),
            HealthRecord::new("o", "rex", HealthRecordType::Vaccination, "Rabies", at(2))
                .with_id("h2")
                .with_follow_up(at(12)),
            HealthRecord::new("o", "mochi", HealthRecordType::Illness, "Cold", at(3))
                .with_id("h3")
                .with_follow_up(at(5)),
            HealthRecord::new("o", "mochi", HealthRecordType::Dental, "Cleaning", at(4)).with_id("h4"),
        ];
        for record in records {
            repo.create(record).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_upcoming_follow_ups_sorted_within_horizon() {
        let repo = seeded().await;
        let due = repo.get_upcoming_follow_ups_at("o", 14, at(6)).await.unwrap();
        let ids: Vec<&str> = due.iter().map(|r| r.id.as_str()).collect();
        // h3 is in the past, h1 exactly at the horizon
        assert_eq!(ids, vec!["h2", "h1"]);
    }

    #[tokio::test]
    async fn test_extreme_horizons() {
        let repo = seeded().await;

        let far = repo.get_upcoming_follow_ups_at("o", 1_000_000_000, at(6)).await.unwrap();
        assert_eq!(far.len(), 2);
        let max = repo.get_upcoming_follow_ups_at("o", i64::MAX, at(6)).await.unwrap();
        assert_eq!(max.len(), 2);

        assert!(repo.get_upcoming_follow_ups_at("o", -1, at(6)).await.unwrap().is_empty());
        assert!(repo.get_upcoming_follow_ups_at("o", i64::MIN, at(6)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unflagged_follow_up_is_ignored() {
        let repo = seeded().await;
        let mut record = repo.get_by_id("h2").await.unwrap().unwrap();
        record.needs_follow_up = false;
        repo.update("h2", record).await.unwrap();

        let due = repo.get_upcoming_follow_ups_at("o", 30, at(6)).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "h1");
    }

    #[tokio::test]
    async fn test_find_by_type_pet_and_range() {
        let repo = seeded().await;
        assert_eq!(repo.find_by_type("o", HealthRecordType::Dental).await.unwrap().len(), 1);
        assert_eq!(repo.find_by_pet("mochi").await.unwrap().len(), 2);
        assert_eq!(repo.find_in_range("o", at(2), at(4)).await.unwrap().len(), 2);
        assert!(repo.find_in_range("other", at(1), at(30)).await.unwrap().is_empty());
    }
}
