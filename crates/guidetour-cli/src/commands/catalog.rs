//! Place, guide and category commands.

use chrono::Weekday;
use clap::Subcommand;
use guidetour_core::{Guide, Place, VisitCategory, YearMonth};

use crate::common::{print_json, split_list, CliResult, Context};

#[derive(Subcommand)]
pub enum PlaceAction {
    /// Register or replace a place
    Add {
        /// Place name
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Comma-separated category names
        #[arg(long)]
        categories: Option<String>,
    },
    /// List places
    List,
}

#[derive(Subcommand)]
pub enum GuideAction {
    /// Register or replace a guide
    Add {
        /// Guide email
        email: String,
        /// Display name
        name: String,
        /// Comma-separated category names the guide is qualified for
        #[arg(long)]
        categories: Option<String>,
    },
    /// List guides
    List,
    /// Days of a month the guide may declare availability for
    Days {
        email: String,
        /// Month as YYYY-MM (default: next month)
        #[arg(long)]
        month: Option<YearMonth>,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Register or replace a custom category
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated weekdays (default: mon-fri)
        #[arg(long)]
        weekdays: Option<String>,
    },
    /// Remove a custom category
    Remove { name: String },
    /// List categories
    List,
}

pub fn run_place(ctx: &Context, action: PlaceAction) -> CliResult {
    let engine = ctx.engine()?;
    match action {
        PlaceAction::Add {
            name,
            description,
            location,
            categories,
        } => {
            let place = Place::new(name, description, location)
                .with_categories(split_list(categories.as_deref()));
            engine.register_place(place.clone())?;
            println!("Place saved: {}", place.name);
        }
        PlaceAction::List => print_json(&engine.catalog().places())?,
    }
    Ok(())
}

pub fn run_guide(ctx: &Context, action: GuideAction) -> CliResult {
    let engine = ctx.engine()?;
    match action {
        GuideAction::Add {
            email,
            name,
            categories,
        } => {
            let guide = Guide::new(email, name).with_categories(split_list(categories.as_deref()));
            engine.register_guide(guide.clone())?;
            println!("Guide saved: {}", guide.email);
        }
        GuideAction::List => print_json(&engine.catalog().guides())?,
        GuideAction::Days { email, month } => {
            let month = month.unwrap_or_else(|| engine.availability_month());
            print_json(&engine.eligible_days_for_guide(&email, month)?)?;
        }
    }
    Ok(())
}

pub fn run_category(ctx: &Context, action: CategoryAction) -> CliResult {
    let engine = ctx.engine()?;
    match action {
        CategoryAction::Add {
            name,
            description,
            weekdays,
        } => {
            let mut category = VisitCategory::new(name, description);
            let days = split_list(weekdays.as_deref());
            if !days.is_empty() {
                let days = days
                    .iter()
                    .map(|d| d.parse::<Weekday>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| format!("invalid weekday list: {}", days.join(",")))?;
                category = category.with_weekdays(days);
            }
            engine.register_category(category.clone())?;
            println!("Category saved: {}", category.name);
        }
        CategoryAction::Remove { name } => {
            if engine.remove_category(&name)? {
                println!("Category removed: {name}");
            } else {
                println!("Category not found: {name}");
            }
        }
        CategoryAction::List => print_json(&engine.catalog().categories())?,
    }
    Ok(())
}
