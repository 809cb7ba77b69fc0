use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use deposit_archive::workflows::archival::{
    ArchivalJob, ArchiveScheduler, ConfigEntry, Deposit, DepositCategory, DepositId,
    DepositService, DepositServiceId, DepositStatus, InMemoryCache, InMemoryDepositStore,
    ManualClock, RunGuard, SchedulePolicy, ServiceType, SkipReason, TickOutcome,
};

const JOB: &str = "system-archive";

fn run_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 24)
        .expect("valid run date")
        .and_hms_opt(1, 15, 0)
        .expect("valid run time")
}

fn service(id: u64, deposit: u64, service_type: ServiceType, age: Duration, disabled: bool) -> DepositService {
    DepositService {
        id: DepositServiceId(id),
        deposit_id: DepositId(deposit),
        service_type,
        created_at: run_time() - age,
        disabled,
    }
}

fn listing(id: u64, category: DepositCategory, status: DepositStatus, services: Vec<DepositService>) -> Deposit {
    Deposit {
        id: DepositId(id),
        category,
        status,
        disabled: false,
        deleted: false,
        services,
    }
}

fn portfolio() -> Vec<Deposit> {
    let mut hidden = listing(
        6,
        DepositCategory::Rent,
        DepositStatus::Accepted,
        Vec::new(),
    );
    hidden.deleted = true;

    vec![
        // Disabled renewal is ignored, the rental ad is stale.
        listing(
            1,
            DepositCategory::Rent,
            DepositStatus::Accepted,
            vec![
                service(11, 1, ServiceType::Renewal, Duration::days(1), true),
                service(12, 1, ServiceType::RentalAdvertisement, Duration::days(20), false),
            ],
        ),
        // Fresh renewal keeps the listing visible.
        listing(
            2,
            DepositCategory::Rent,
            DepositStatus::SystemArchived,
            vec![service(21, 2, ServiceType::Renewal, Duration::days(2), false)],
        ),
        // No services at all.
        listing(3, DepositCategory::Sale, DepositStatus::Accepted, Vec::new()),
        // Sale ads live longer than rent ads.
        listing(
            4,
            DepositCategory::Sale,
            DepositStatus::Accepted,
            vec![service(41, 4, ServiceType::SalesAdvertisement, Duration::days(20), false)],
        ),
        // Rejected listings are outside the managed lifecycle.
        listing(5, DepositCategory::Sale, DepositStatus::Rejected, Vec::new()),
        hidden,
    ]
}

fn configuration() -> Vec<ConfigEntry> {
    vec![
        ConfigEntry::new(DepositCategory::Rent.duration_key(), "10"),
        ConfigEntry::new(DepositCategory::Sale.duration_key(), "30"),
    ]
}

fn status(store: &InMemoryDepositStore, id: u64) -> DepositStatus {
    store
        .deposit(DepositId(id))
        .expect("deposit present")
        .status
}

#[tokio::test]
async fn daily_run_archives_lapsed_listings_once() {
    let store = InMemoryDepositStore::new(portfolio(), configuration());
    let cache = Arc::new(InMemoryCache::default());
    let clock = Arc::new(ManualClock::new(run_time()));
    let mut scheduler = ArchiveScheduler::new(
        ArchivalJob::new(Arc::new(store.clone()), cache.clone(), JOB),
        RunGuard::new(cache.clone(), JOB),
        SchedulePolicy::default(),
        clock.clone(),
    );

    let report = match scheduler.tick().await {
        TickOutcome::Completed(report) => report,
        other => panic!("expected a completed run, got {other:?}"),
    };

    assert_eq!(report.rent.evaluated, 2);
    assert_eq!(report.sale.evaluated, 2);
    assert_eq!(report.rent.archived, 1);
    assert_eq!(report.rent.reinstated, 1);
    assert_eq!(report.sale.archived, 1);
    assert_eq!(report.committed, 3);

    assert_eq!(status(&store, 1), DepositStatus::SystemArchived);
    assert_eq!(status(&store, 2), DepositStatus::Accepted);
    assert_eq!(status(&store, 3), DepositStatus::SystemArchived);
    assert_eq!(status(&store, 4), DepositStatus::Accepted);
    assert_eq!(status(&store, 5), DepositStatus::Rejected);
    assert_eq!(status(&store, 6), DepositStatus::Accepted);

    clock.advance(Duration::minutes(30));
    assert!(matches!(
        scheduler.tick().await,
        TickOutcome::Skipped(SkipReason::AlreadyRanToday)
    ));
    assert_eq!(store.sessions_opened(), 1);
}

#[tokio::test]
async fn run_marker_is_scoped_to_the_job_name() {
    let cache = Arc::new(InMemoryCache::default());
    let archive = RunGuard::new(cache.clone(), JOB);
    let other = RunGuard::new(cache.clone(), "featured-expiry");

    archive.record(run_time()).await.expect("marker written");

    assert_eq!(
        archive.last_run_date().await.expect("marker readable"),
        Some(run_time().date())
    );
    assert_eq!(other.last_run_date().await.expect("marker readable"), None);
    assert_ne!(archive.key(), other.key());
}
