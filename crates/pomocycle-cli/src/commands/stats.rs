use std::path::Path;

use chrono::Local;
use clap::Subcommand;
use pomocycle_core::storage::import_legacy_csv;
use pomocycle_core::{Database, DailyTotal, SessionStore, StatsAggregator};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's focus minutes
    Today,
    /// Trailing seven-day report
    Week,
    /// Every recorded session
    Sessions,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let stats = StatsAggregator::new(&db);
    let today = Local::now().date_naive();

    match action {
        StatsAction::Today => {
            let total = DailyTotal {
                date: today,
                total_minutes: stats.total_minutes(today)?,
            };
            println!("{}", serde_json::to_string_pretty(&total)?);
        }
        StatsAction::Week => {
            let report = stats.weekly_report(today)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StatsAction::Sessions => {
            let records = db.list_all()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}

pub fn import(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let count = import_legacy_csv(path, &db)?;
    println!("imported {count} sessions");
    Ok(())
}
