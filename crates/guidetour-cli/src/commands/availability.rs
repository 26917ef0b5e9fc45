//! Guide availability commands.

use clap::Subcommand;
use guidetour_core::YearMonth;
use serde::Serialize;

use crate::common::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum AvailabilityAction {
    /// Whether collection is open and for which month
    Status,
    /// Days a guide declared
    Show {
        email: String,
        /// Month as YYYY-MM (default: next month)
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Replace a guide's declared days of next month
    Set {
        email: String,
        /// Days of the month
        #[arg(required = true)]
        days: Vec<u32>,
    },
}

#[derive(Serialize)]
struct Status {
    open: bool,
    month: String,
}

pub fn run(ctx: &Context, action: AvailabilityAction) -> CliResult {
    let engine = ctx.engine()?;
    match action {
        AvailabilityAction::Status => print_json(&Status {
            open: engine.availability_open(),
            month: engine.availability_month().to_string(),
        })?,
        AvailabilityAction::Show { email, month } => {
            let month = month.unwrap_or_else(|| engine.availability_month());
            print_json(&engine.days_available(&email, month))?;
        }
        AvailabilityAction::Set { email, days } => {
            let month = engine.availability_month();
            let dates = days
                .iter()
                .map(|d| month.day(*d).ok_or_else(|| format!("{month} has no day {d}")))
                .collect::<Result<Vec<_>, _>>()?;
            engine.save_availability(&email, &dates)?;
            println!("Availability saved: {email} ({} days in {month})", dates.len());
        }
    }
    Ok(())
}
