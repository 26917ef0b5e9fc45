//! Lifecycle scheduler commands.

use clap::Subcommand;
use guidetour_core::{CycleSteps, WorkerPool};
use std::time::Duration;

use crate::common::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum SchedulerAction {
    /// Run every maintenance pass once and print the report
    RunOnce,
    /// Run an immediate cycle, then periodic cycles until interrupted
    Watch {
        /// Seconds between cycles (default: scheduler.interval_secs)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long = "for")]
        run_for: Option<u64>,
    },
}

pub fn run(ctx: &Context, action: SchedulerAction) -> CliResult {
    let engine = ctx.engine()?;
    match action {
        SchedulerAction::RunOnce => {
            let report = engine.lifecycle().run_cycle(CycleSteps::ALL);
            print_json(&report)?;
        }
        SchedulerAction::Watch { interval, run_for } => {
            let interval = interval
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or_else(|| ctx.config.scheduler.interval());
            let steps = CycleSteps::periodic(&ctx.config.scheduler);

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let pool = WorkerPool::new(runtime.handle().clone());
            let scheduler = engine.scheduler(pool.clone());

            runtime.block_on(async {
                scheduler.start(interval, steps);
                match run_for {
                    Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                    None => {
                        if let Err(e) = tokio::signal::ctrl_c().await {
                            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                        }
                    }
                }
            });

            scheduler.stop_periodic();
            pool.shutdown();
            println!("Cycles run: {}", engine.lifecycle().cycles_run());
        }
    }
    Ok(())
}
