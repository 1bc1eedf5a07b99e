use chrono::Local;
use clap::Args;
use pawlog_core::Workspace;

use crate::config::Config;
use crate::error::CommandError;

/// Show upcoming follow-ups, medications running low and food to restock
#[derive(Args)]
pub struct RemindersCommand {
    /// How far ahead to look for follow-up visits, in days
    #[arg(long, default_value_t = 14)]
    days: i64,

    /// Warn when a medication has this many doses or fewer left
    #[arg(long, default_value_t = 5)]
    min_doses: u32,
}

impl RemindersCommand {
    pub async fn run(&self, ws: &Workspace, config: &Config) -> Result<(), CommandError> {
        let owner = config.owner_id.value.as_str();
        let today = Local::now().date_naive();

        let follow_ups = ws
            .health_records
            .get_upcoming_follow_ups(owner, self.days)
            .await?;
        let active = ws.medications.get_active_on(owner, today).await?;
        let refills = ws.medications.get_needing_refill(owner, self.min_doses).await?;
        let low_stock = ws.food_items.get_low_stock(owner).await?;

        println!("Follow-ups (next {} days)", self.days);
        if follow_ups.is_empty() {
            println!("  none");
        }
        for record in &follow_ups {
            if let Some(date) = record.follow_up_date {
                println!("  {}  {} ({})", date.format("%Y-%m-%d"), record.title, record.record_type);
            }
        }
        println!();

        println!("Medications today");
        if active.is_empty() {
            println!("  none");
        }
        for med in &active {
            println!("  {} {} ({})", med.name, med.dosage, med.frequency);
        }
        println!();

        println!("Refills needed");
        if refills.is_empty() {
            println!("  none");
        }
        for med in &refills {
            println!(
                "  {}: {} doses left",
                med.name,
                med.remaining_doses.unwrap_or_default()
            );
        }
        println!();

        println!("Low stock");
        if low_stock.is_empty() {
            println!("  none");
        }
        for food in &low_stock {
            println!("  {}: {:.0} g left", food.name, food.stock_grams);
        }

        Ok(())
    }
}
