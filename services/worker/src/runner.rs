use crate::cli::SweepArgs;
use crate::demo;
use deposit_archive::config::{AppConfig, ArchiveConfig};
use deposit_archive::error::AppError;
use deposit_archive::telemetry;
use deposit_archive::workflows::archival::{
    ArchivalJob, ArchiveScheduler, Clock, DepositCategory, InMemoryCache, RunGuard, SystemClock,
    TickOutcome,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn build_scheduler(config: &ArchiveConfig, clock: Arc<dyn Clock>) -> ArchiveScheduler {
    let store = Arc::new(demo::seeded_store(clock.now()));
    let cache = Arc::new(InMemoryCache::default());

    ArchiveScheduler::new(
        ArchivalJob::new(store, cache.clone(), &config.job_name),
        RunGuard::new(cache, &config.job_name),
        config.policy(),
        clock,
    )
}

pub(crate) async fn run_scheduler() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let scheduler = build_scheduler(&config.archive, Arc::new(SystemClock));
    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(err) => warn!(error = %err, "unable to listen for shutdown signal; stopping"),
        }
        signal_token.cancel();
    });

    info!(
        ?config.environment,
        job = %config.archive.job_name,
        policy = ?config.archive.policy(),
        "deposit archive worker ready"
    );

    scheduler.run(shutdown).await;
    Ok(())
}

pub(crate) async fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut scheduler = build_scheduler(&config.archive, Arc::new(SystemClock));

    match scheduler.run_now(args.force).await {
        TickOutcome::Completed(report) => {
            println!("Deposit archival sweep ({})", config.archive.job_name);
            for category in DepositCategory::ALL {
                let summary = report.partition(category);
                println!(
                    "- {category}: {} evaluated, {} archived, {} reinstated",
                    summary.evaluated, summary.archived, summary.reinstated
                );
            }
            println!("Committed status changes: {}", report.committed);
            Ok(())
        }
        TickOutcome::Skipped(reason) => {
            println!("Sweep skipped: {reason:?}");
            Ok(())
        }
        TickOutcome::Failed(failure) => Err(failure.into()),
    }
}
