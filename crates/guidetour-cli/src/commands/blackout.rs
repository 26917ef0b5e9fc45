use chrono::NaiveDate;
use clap::Subcommand;

use crate::common::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum BlackoutAction {
    /// Block a date for visits
    Add {
        date: NaiveDate,
        /// Why the date is blocked
        #[arg(default_value = "closed")]
        reason: String,
    },
    /// Unblock a date
    Remove { date: NaiveDate },
    /// List blackout dates
    List,
}

pub fn run(ctx: &Context, action: BlackoutAction) -> CliResult {
    let engine = ctx.engine()?;
    match action {
        BlackoutAction::Add { date, reason } => {
            if engine.add_blackout_date(date, &reason)? {
                println!("Blackout added: {date}");
            } else {
                println!("Blackout already present: {date}");
            }
        }
        BlackoutAction::Remove { date } => {
            if engine.remove_blackout_date(date)? {
                println!("Blackout removed: {date}");
            } else {
                println!("Blackout not found: {date}");
            }
        }
        BlackoutAction::List => print_json(&engine.blackout_dates())?,
    }
    Ok(())
}
