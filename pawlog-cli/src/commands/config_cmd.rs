use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::Config;
use crate::error::CommandError;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# pawlog configuration

# Path to the local SQLite database (default: platform data dir/pawlog/pawlog.db)
# database_path: pawlog.db

# Owner id stamped on new records
owner_id: default

# sync:
#   server_url: "http://localhost:8080"
#   api_key: "your-api-key"
#   auto_sync: false
#   timeout_secs: 10
#   conflict_policy: prefer-local
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config, cli_config_path: Option<PathBuf>) -> Result<(), CommandError> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&redacted(config))?);
                    }
                    OutputFormat::Text => print_config(config),
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'pawlog config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

/// Copy of the config that is safe to print.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.sync.api_key.is_some() {
        config.sync.api_key = Some("********".to_string());
    }
    config
}

fn print_config(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("database_path: {}", config.database_path.value.display());
    println!("  source: {}", config.database_path.source);
    println!();

    println!("owner_id: {}", config.owner_id.value);
    println!("  source: {}", config.owner_id.source);
    println!();

    println!(
        "sync.server_url: {}",
        config.sync.server_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "sync.api_key: {}",
        if config.sync.api_key.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!("sync.auto_sync: {}", config.sync.auto_sync);
    println!("sync.timeout_secs: {}", config.sync.timeout_secs);
    println!("sync.conflict_policy: {}", config.sync.conflict_policy);
}
