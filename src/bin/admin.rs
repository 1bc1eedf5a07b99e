//! Pawlog Admin CLI
//!
//! Administration tool for managing API keys on the sync server.
//!
//! # Usage
//!
//! ```bash
//! pawlog-admin key add phone
//! pawlog-admin key list
//! pawlog-admin key remove phone
//! ```
//!
//! # Environment Variables
//!
//! - `PAWLOG_SERVER_CONFIG`: Path to the server config file (default: ~/.config/pawlog-server/config.yaml)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use pawlog::server::{hash_key, ApiKeyEntry, ConfigFile, ServerConfig};
use rand::Rng;
use std::path::{Path, PathBuf};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "pawlog-admin")]
#[command(version)]
#[command(about = "Pawlog server administration tool")]
struct Cli {
    /// Path to the server config file
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage API keys
    Key(KeyCommand),
}

#[derive(Args)]
struct KeyCommand {
    #[command(subcommand)]
    command: KeySubcommand,
}

#[derive(Subcommand)]
enum KeySubcommand {
    /// Generate a new API key for a client
    Add {
        /// Client name (e.g. "phone")
        name: String,
    },
    /// List configured clients
    List,
    /// Revoke a client's key
    Remove {
        /// Client name
        name: String,
    },
}

/// Generates a secure random key: 32 random bytes, base64url without padding.
fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ============================================================================
// Commands
// ============================================================================

fn add_key(path: &Path, name: String) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ConfigFile::load(path)?;

    if config.api_keys.iter().any(|e| e.name == name) {
        return Err(format!("Client '{}' already exists", name).into());
    }

    let key = generate_key();
    config.api_keys.push(ApiKeyEntry {
        name: name.clone(),
        key: None,
        key_hash: Some(hash_key(&key)),
        created_at: Some(Utc::now().to_rfc3339()),
    });
    config.save(path)?;

    println!("Added client: {}", name);
    println!("  API key: {}", key);
    println!();
    println!("The key is shown only once. Restart the server to load it.");

    Ok(())
}

fn list_keys(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::load(path)?;

    if config.api_keys.is_empty() {
        println!("No API keys configured.");
        return Ok(());
    }

    println!("{:<24} {:<10} {:<30}", "NAME", "STORED AS", "CREATED");
    println!("{}", "-".repeat(64));

    for entry in &config.api_keys {
        let stored = if entry.key_hash.is_some() {
            "hash"
        } else {
            "plain"
        };
        println!(
            "{:<24} {:<10} {:<30}",
            entry.name,
            stored,
            entry.created_at.as_deref().unwrap_or("")
        );
    }

    println!();
    println!("Total: {} key(s)", config.api_keys.len());

    Ok(())
}

fn remove_key(path: &Path, name: String) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ConfigFile::load(path)?;

    let before = config.api_keys.len();
    config.api_keys.retain(|e| e.name != name);
    if config.api_keys.len() == before {
        return Err(format!("Client '{}' not found", name).into());
    }

    config.save(path)?;
    println!("Removed client: {}", name);

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let path = cli
        .config
        .or_else(|| std::env::var("PAWLOG_SERVER_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(ServerConfig::default_config_path);

    let result = match cli.command {
        Commands::Key(key_cmd) => match key_cmd.command {
            KeySubcommand::Add { name } => add_key(&path, name),
            KeySubcommand::List => list_keys(&path),
            KeySubcommand::Remove { name } => remove_key(&path, name),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
