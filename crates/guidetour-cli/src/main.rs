use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use guidetour_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "guidetour", version, about = "Guided tour scheduling")]
struct Cli {
    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place management
    Place {
        #[command(subcommand)]
        action: commands::catalog::PlaceAction,
    },
    /// Guide management
    Guide {
        #[command(subcommand)]
        action: commands::catalog::GuideAction,
    },
    /// Visit category management
    Category {
        #[command(subcommand)]
        action: commands::catalog::CategoryAction,
    },
    /// Visit planning, reservations and state
    Visit {
        #[command(subcommand)]
        action: commands::visit::VisitAction,
    },
    /// Guide availability for next month
    Availability {
        #[command(subcommand)]
        action: commands::availability::AvailabilityAction,
    },
    /// Blackout dates
    Blackout {
        #[command(subcommand)]
        action: commands::blackout::BlackoutAction,
    },
    /// Lifecycle maintenance
    Scheduler {
        #[command(subcommand)]
        action: commands::scheduler::SchedulerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let ctx = common::Context {
        config,
        today: cli.today,
    };
    let result = match cli.command {
        Commands::Place { action } => commands::catalog::run_place(&ctx, action),
        Commands::Guide { action } => commands::catalog::run_guide(&ctx, action),
        Commands::Category { action } => commands::catalog::run_category(&ctx, action),
        Commands::Visit { action } => commands::visit::run(&ctx, action),
        Commands::Availability { action } => commands::availability::run(&ctx, action),
        Commands::Blackout { action } => commands::blackout::run(&ctx, action),
        Commands::Scheduler { action } => commands::scheduler::run(&ctx, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
