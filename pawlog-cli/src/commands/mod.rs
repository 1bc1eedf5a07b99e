mod config_cmd;
mod pet;
mod reminders;
mod sync_cmd;

use clap::ValueEnum;

pub use config_cmd::ConfigCommand;
pub use pet::PetCommand;
pub use reminders::RemindersCommand;
pub use sync_cmd::SyncCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
