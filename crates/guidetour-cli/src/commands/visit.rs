//! Visit planning commands.

use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use guidetour_core::{GuidedVisitRequest, Visit, VisitState};

use crate::common::{parse_time, print_json, split_list, CliResult, Context};

#[derive(Subcommand)]
pub enum VisitAction {
    /// Plan a visit at a place
    Plan {
        /// Visit title
        title: String,
        #[arg(long)]
        place: String,
        /// Comma-separated category names
        #[arg(long)]
        categories: String,
        #[arg(long)]
        date: NaiveDate,
        /// Start time (HH:MM); leave unset to schedule later
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        /// Duration in minutes
        #[arg(long, default_value = "60")]
        duration: u32,
        #[arg(long, default_value = "20")]
        capacity: u32,
        /// Participants needed for the visit to be confirmed
        #[arg(long, default_value = "1")]
        min: u32,
        /// Guide email
        #[arg(long)]
        guide: Option<String>,
        #[arg(long)]
        ticket: bool,
        #[arg(long)]
        accessible: bool,
    },
    /// Plan a visit for a category at the first free place and slot
    Guided {
        title: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "60")]
        duration: u32,
        #[arg(long, default_value = "20")]
        capacity: u32,
        #[arg(long, default_value = "1")]
        min: u32,
    },
    /// Free start times at a place
    Slots {
        #[arg(long)]
        place: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "60")]
        duration: u32,
    },
    /// List visits
    List {
        /// Only visits on this date
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only visits led by this guide
        #[arg(long)]
        guide: Option<String>,
    },
    /// Show a visit
    Get { id: String },
    /// Assign a guide
    Assign { id: String, guide: String },
    /// Reserve seats
    Reserve { id: String, seats: u32 },
    /// Release reserved seats
    Release { id: String, seats: u32 },
    /// Change state (proposed, complete, confirmed, cancelled, held)
    State { id: String, state: VisitState },
}

pub fn run(ctx: &Context, action: VisitAction) -> CliResult {
    let engine = ctx.engine()?;
    match action {
        VisitAction::Plan {
            title,
            place,
            categories,
            date,
            start,
            duration,
            capacity,
            min,
            guide,
            ticket,
            accessible,
        } => {
            let mut draft = Visit::new(title, place, date, start, duration)
                .with_categories(split_list(Some(&categories)))
                .with_seats(capacity, min);
            draft.guide = guide;
            draft.ticket_required = ticket;
            draft.accessible = accessible;
            let visit = engine.plan_visit(draft)?;
            println!("Visit planned: {}", visit.id);
            print_json(&visit)?;
        }
        VisitAction::Guided {
            title,
            category,
            date,
            duration,
            capacity,
            min,
        } => {
            let visit = engine.plan_guided_visit(GuidedVisitRequest {
                title,
                category,
                date,
                duration_minutes: duration,
                capacity,
                min_participants: min,
            })?;
            println!("Visit planned: {}", visit.id);
            print_json(&visit)?;
        }
        VisitAction::Slots {
            place,
            date,
            duration,
        } => {
            for slot in engine.find_slots(date, &place, duration)? {
                println!("{}", slot.format("%H:%M"));
            }
        }
        VisitAction::List { date, guide } => {
            let mut visits = match (guide.as_deref(), date) {
                (Some(g), _) => engine.visits_led_by(g),
                (None, Some(d)) => engine.visits_on(d),
                (None, None) => engine.visits(),
            };
            visits.retain(|v| date.map_or(true, |d| v.date == d));
            print_json(&visits)?;
        }
        VisitAction::Get { id } => print_json(&engine.visit(&id)?)?,
        VisitAction::Assign { id, guide } => print_json(&engine.assign_guide(&id, &guide)?)?,
        VisitAction::Reserve { id, seats } => print_json(&engine.reserve(&id, seats)?)?,
        VisitAction::Release { id, seats } => print_json(&engine.release(&id, seats)?)?,
        VisitAction::State { id, state } => print_json(&engine.transition(&id, state)?)?,
    }
    Ok(())
}
