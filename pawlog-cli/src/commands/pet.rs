use chrono::NaiveDate;
use clap::{Args, Subcommand};
use pawlog_core::{Pet, Species, Workspace};

use super::OutputFormat;
use crate::config::Config;
use crate::error::CommandError;

#[derive(Args)]
pub struct PetCommand {
    #[command(subcommand)]
    pub command: PetSubcommand,
}

#[derive(Subcommand)]
pub enum PetSubcommand {
    /// Add a pet
    Add {
        /// Pet name
        name: String,

        /// Species (dog, cat, bird, rabbit, reptile, fish, other)
        #[arg(long, short, default_value = "dog")]
        species: String,

        #[arg(long)]
        breed: Option<String>,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<String>,

        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,
    },

    /// List your pets
    List {
        /// Only pets of this species
        #[arg(long, short)]
        species: Option<String>,

        /// Only pets whose name contains this text
        #[arg(long)]
        name: Option<String>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one pet
    Show {
        id: String,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove a pet
    Remove { id: String },
}

impl PetSubcommand {
    pub fn is_write(&self) -> bool {
        matches!(self, PetSubcommand::Add { .. } | PetSubcommand::Remove { .. })
    }
}

impl PetCommand {
    pub async fn run(&self, ws: &Workspace, config: &Config) -> Result<(), CommandError> {
        let owner = config.owner_id.value.as_str();
        match &self.command {
            PetSubcommand::Add {
                name,
                species,
                breed,
                birth_date,
                weight,
            } => {
                let mut pet = Pet::new(owner, name.as_str(), parse_species(species)?);
                if let Some(breed) = breed {
                    pet = pet.with_breed(breed.as_str());
                }
                if let Some(date) = birth_date {
                    pet = pet.with_birth_date(parse_date(date)?);
                }
                if let Some(kg) = weight {
                    pet = pet.with_weight_kg(*kg);
                }

                let created = ws.pets.create(pet).await?;
                println!("Added {}", created);
                println!("ID: {}", created.id);
                Ok(())
            }

            PetSubcommand::List {
                species,
                name,
                format,
            } => {
                let mut pets = match species {
                    Some(s) => ws.pets.find_by_species(owner, parse_species(s)?).await?,
                    None => ws.pets.find_by_owner(owner).await?,
                };
                if let Some(needle) = name {
                    let needle = needle.to_lowercase();
                    pets.retain(|p| p.name.to_lowercase().contains(&needle));
                }
                pets.sort_by(|a, b| a.name.cmp(&b.name));

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pets)?),
                    OutputFormat::Text => {
                        if pets.is_empty() {
                            println!("No pets found.");
                        }
                        for pet in &pets {
                            println!("{}  {}", pet.id, pet);
                        }
                    }
                }
                Ok(())
            }

            PetSubcommand::Show { id, format } => {
                let pet = ws
                    .pets
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| CommandError::NotFound(format!("pet {}", id)))?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pet)?),
                    OutputFormat::Text => print_pet_details(&pet),
                }
                Ok(())
            }

            PetSubcommand::Remove { id } => {
                if ws.pets.delete(id).await? {
                    println!("Removed pet {}", id);
                    Ok(())
                } else {
                    Err(CommandError::NotFound(format!("pet {}", id)))
                }
            }
        }
    }
}

fn print_pet_details(pet: &Pet) {
    println!("{}", pet);
    println!("ID: {}", pet.id);
    if let Some(date) = pet.birth_date {
        println!("Born: {}", date);
    }
    if let Some(kg) = pet.weight_kg {
        println!("Weight: {:.1} kg", kg);
    }
    if let Some(chip) = &pet.microchip_id {
        println!("Microchip: {}", chip);
    }
    if let Some(vet) = &pet.vet {
        match &vet.clinic {
            Some(clinic) => println!("Vet: {} ({})", vet.name, clinic),
            None => println!("Vet: {}", vet.name),
        }
    }
}

fn parse_species(s: &str) -> Result<Species, CommandError> {
    s.parse().map_err(CommandError::InvalidInput)
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CommandError::InvalidInput(format!("Invalid date format '{}'. Use YYYY-MM-DD.", s)))
}
