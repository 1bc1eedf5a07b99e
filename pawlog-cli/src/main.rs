use clap::{Parser, Subcommand};
use pawlog_core::Workspace;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod context;
mod error;

use commands::{ConfigCommand, PetCommand, RemindersCommand, SyncCommand};
use config::Config;
use error::CommandError;

#[derive(Parser)]
#[command(name = "pawlog")]
#[command(version)]
#[command(about = "Offline-first pet care log", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage pets
    Pet(PetCommand),

    /// Show upcoming follow-ups, medication doses and low stock
    Reminders(RemindersCommand),

    /// Sync with the remote server
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), CommandError> {
    let cli = Cli::parse();

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    // Config commands never touch the database.
    if let Commands::Config(cmd) = &command {
        return cmd.run(&config, cli_config_path);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let ws = context::open_workspace(&config).await?;
        let result = execute_command(&command, &ws, &config).await;

        if result.is_ok() && is_write_command(&command) {
            try_auto_sync(&ws, &config).await;
        }

        result
    })
}

async fn execute_command(
    command: &Commands,
    ws: &Workspace,
    config: &Config,
) -> Result<(), CommandError> {
    match command {
        Commands::Pet(cmd) => cmd.run(ws, config).await,
        Commands::Reminders(cmd) => cmd.run(ws, config).await,
        Commands::Sync(cmd) => cmd.run(ws, config).await,
        Commands::Config(cmd) => cmd.run(config, None),
    }
}

/// Returns true if the command changes local records and should push afterwards.
fn is_write_command(cmd: &Commands) -> bool {
    matches!(cmd, Commands::Pet(p) if p.command.is_write())
}

/// Pushes pending mirror operations when auto-sync is enabled.
///
/// Failures stay in the outbox for the next run; the CLI works offline.
async fn try_auto_sync(ws: &Workspace, config: &Config) {
    if !config.sync.auto_sync || !config.sync.is_configured() {
        return;
    }

    let reports = ws.push_pending_all().await;
    let failed: usize = reports.iter().map(|r| r.push_failed).sum();
    if failed > 0 {
        eprintln!("Auto-sync: {} record(s) still pending", failed);
    } else {
        tracing::debug!("Auto-sync complete");
    }
}
