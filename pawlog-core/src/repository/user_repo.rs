use super::{Repository, RepositoryError};
use crate::models::User;

impl Repository<User> {
    /// Case-insensitive lookup by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .find(|u| u.email.to_lowercase() == email))
    }
}
