use super::{Repository, RepositoryError};
use crate::models::{Pet, Species};

impl Repository<Pet> {
    pub async fn find_by_species(
        &self,
        owner_id: &str,
        species: Species,
    ) -> Result<Vec<Pet>, RepositoryError> {
        self.find(|p| p.owner_id == owner_id && p.species == species)
            .await
    }

    /// Case-insensitive substring match on the pet's name.
    pub async fn find_by_name(&self, owner_id: &str, name: &str) -> Result<Vec<Pet>, RepositoryError> {
        let needle = name.to_lowercase();
        self.find(|p| p.owner_id == owner_id && p.name.to_lowercase().contains(&needle))
            .await
    }
}
