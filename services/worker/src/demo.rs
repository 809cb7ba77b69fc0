use chrono::{Duration, NaiveDateTime};
use deposit_archive::workflows::archival::{
    ConfigEntry, Deposit, DepositCategory, DepositId, DepositService, DepositServiceId,
    DepositStatus, InMemoryDepositStore, ServiceType,
};

/// Small mixed portfolio so the worker has something to reconcile when no
/// external store is wired in.
pub(crate) fn seeded_store(now: NaiveDateTime) -> InMemoryDepositStore {
    let service = |id: u64, deposit: u64, service_type: ServiceType, days_ago: i64| DepositService {
        id: DepositServiceId(id),
        deposit_id: DepositId(deposit),
        service_type,
        created_at: now - Duration::days(days_ago),
        disabled: false,
    };

    let deposit = |id: u64, category: DepositCategory, status: DepositStatus, services| Deposit {
        id: DepositId(id),
        category,
        status,
        disabled: false,
        deleted: false,
        services,
    };

    InMemoryDepositStore::new(
        vec![
            deposit(
                1001,
                DepositCategory::Rent,
                DepositStatus::Accepted,
                vec![service(1, 1001, ServiceType::RentalAdvertisement, 3)],
            ),
            deposit(
                1002,
                DepositCategory::Rent,
                DepositStatus::Accepted,
                vec![service(2, 1002, ServiceType::RentalAdvertisement, 45)],
            ),
            deposit(
                1003,
                DepositCategory::Rent,
                DepositStatus::SystemArchived,
                vec![
                    service(3, 1003, ServiceType::RentalAdvertisement, 60),
                    service(4, 1003, ServiceType::Renewal, 1),
                ],
            ),
            deposit(
                2001,
                DepositCategory::Sale,
                DepositStatus::Accepted,
                vec![service(5, 2001, ServiceType::SalesAdvertisement, 20)],
            ),
            deposit(2002, DepositCategory::Sale, DepositStatus::Accepted, Vec::new()),
        ],
        vec![
            ConfigEntry::new(DepositCategory::Rent.duration_key(), "30"),
            ConfigEntry::new(DepositCategory::Sale.duration_key(), "60"),
        ],
    )
}
