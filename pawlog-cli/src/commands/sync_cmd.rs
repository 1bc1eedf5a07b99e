//! Sync CLI commands for reconciling with the server.

use clap::{Args, Subcommand};
use pawlog_core::{HttpRemoteStore, Reconcile, SyncReport, Workspace};

use crate::config::Config;
use crate::error::CommandError;

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Only this collection (e.g. "pets")
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Upload local records
    Push {
        /// Only retry mirrors that failed earlier
        #[arg(long)]
        pending: bool,
    },

    /// Download records missing locally
    Pull,

    /// Compare local and remote ids without changing anything
    Diff,

    /// List mirrors waiting to be retried
    Pending,

    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, ws: &Workspace, config: &Config) -> Result<(), CommandError> {
        let engines = self.engines(ws)?;
        let owner = config.owner_id.value.as_str();

        match &self.command {
            None => {
                require_configured(config)?;
                println!("Syncing with server...");
                println!();
                let mut reports = Vec::new();
                for engine in &engines {
                    reports.push(engine.sync(owner).await);
                }
                print_reports(&reports);
            }
            Some(SyncSubcommand::Push { pending }) => {
                require_configured(config)?;
                let mut reports = Vec::new();
                for engine in &engines {
                    let report = if *pending {
                        engine.push_pending().await
                    } else {
                        engine.push().await
                    };
                    reports.push(report);
                }
                print_reports(&reports);
            }
            Some(SyncSubcommand::Pull) => {
                require_configured(config)?;
                let mut reports = Vec::new();
                for engine in &engines {
                    reports.push(engine.pull(owner).await);
                }
                print_reports(&reports);
            }
            Some(SyncSubcommand::Diff) => {
                require_configured(config)?;
                self.diff(&engines, owner).await?;
            }
            Some(SyncSubcommand::Pending) => self.pending(&engines).await?,
            Some(SyncSubcommand::Status) => self.status(&engines, config).await?,
        }

        Ok(())
    }

    fn engines<'a>(&self, ws: &'a Workspace) -> Result<Vec<&'a dyn Reconcile>, CommandError> {
        match &self.collection {
            Some(name) => ws.engine(name).map(|engine| vec![engine]).ok_or_else(|| {
                CommandError::InvalidInput(format!(
                    "Unknown collection '{}'. Valid options: {}",
                    name,
                    ws.collections().join(", ")
                ))
            }),
            None => Ok(ws.engines()),
        }
    }

    async fn diff(&self, engines: &[&dyn Reconcile], owner: &str) -> Result<(), CommandError> {
        for engine in engines {
            let diff = engine.diagnostic_diff(owner).await?;
            if diff.is_in_sync() {
                println!("  ✓ {} in sync", engine.collection());
                continue;
            }
            println!("  ✗ {}", engine.collection());
            for id in &diff.local_only_ids {
                println!("      local only:  {}", id);
            }
            for id in &diff.remote_only_ids {
                println!("      remote only: {}", id);
            }
        }
        Ok(())
    }

    async fn pending(&self, engines: &[&dyn Reconcile]) -> Result<(), CommandError> {
        let mut total = 0;
        for engine in engines {
            let pending = engine.pending().await?;
            total += pending.len();
            for entry in &pending {
                println!(
                    "  {} {} {} (attempts: {}, queued {})",
                    engine.collection(),
                    entry.op,
                    entry.id,
                    entry.attempts,
                    entry.queued_at.format("%Y-%m-%d %H:%M")
                );
                if let Some(err) = &entry.last_error {
                    println!("      last error: {}", err);
                }
            }
        }
        if total == 0 {
            println!("Nothing pending.");
        }
        Ok(())
    }

    async fn status(&self, engines: &[&dyn Reconcile], config: &Config) -> Result<(), CommandError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        let mut pending = 0;
        for engine in engines {
            pending += engine.pending().await?.len();
        }

        let (url, key) = match (&config.sync.server_url, &config.sync.api_key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                println!("Status: Not configured");
                println!("Pending mirrors: {}", pending);
                println!();
                println!("To enable sync, add to your config file:");
                println!();
                println!("  sync:");
                println!("    server_url: \"http://localhost:8080\"");
                println!("    api_key: \"your-api-key\"");
                println!();
                println!("Or set environment variables:");
                println!("  PAWLOG_SYNC_URL");
                println!("  PAWLOG_SYNC_API_KEY");
                return Ok(());
            }
        };

        println!("Server:          {}", url);
        println!("Owner:           {}", config.owner_id.value);
        println!("Conflict policy: {}", config.sync.conflict_policy);
        println!(
            "Auto-sync:       {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!("Pending mirrors: {}", pending);
        println!();

        print!("Server status: ");
        let client = HttpRemoteStore::new(url.as_str(), key.as_str(), config.sync.timeout())?;
        if client.check_health().await {
            println!("✓ connected");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}

fn require_configured(config: &Config) -> Result<(), CommandError> {
    if config.sync.is_configured() {
        Ok(())
    } else {
        Err(CommandError::NotConfigured)
    }
}

fn print_reports(reports: &[SyncReport]) {
    for report in reports {
        let mark = if report.is_clean() { "✓" } else { "✗" };
        println!("  {} {}", mark, report);
        for id in &report.conflicts {
            println!("      conflict: {}", id);
        }
        for id in &report.local_only_ids {
            println!("      local only: {}", id);
        }
        for id in &report.remote_only_ids {
            println!("      remote only: {}", id);
        }
    }

    println!();
    if reports.iter().all(SyncReport::is_clean) {
        println!("Sync complete.");
    } else {
        println!("Sync finished with errors.");
    }
}
