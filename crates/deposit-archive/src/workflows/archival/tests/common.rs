use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tokio::sync::{Notify, Semaphore};

use crate::workflows::archival::domain::{
    CandidateQuery, ConfigEntry, Deposit, DepositCategory, DepositId, DepositService,
    DepositServiceId, DepositStatus, ServiceType, StatusChange,
};
use crate::workflows::archival::memory::InMemoryDepositStore;
use crate::workflows::archival::repository::{
    CacheError, DepositSession, DepositStore, RepositoryError, SharedCache,
};

pub(super) const JOB: &str = "system-archive";

/// 01:30 on a Monday, inside the default run window.
pub(super) fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .expect("valid date")
        .and_hms_opt(1, 30, 0)
        .expect("valid time")
}

pub(super) fn service(
    id: u64,
    deposit: u64,
    service_type: ServiceType,
    days_ago: i64,
    disabled: bool,
) -> DepositService {
    DepositService {
        id: DepositServiceId(id),
        deposit_id: DepositId(deposit),
        service_type,
        created_at: now() - Duration::days(days_ago),
        disabled,
    }
}

pub(super) fn deposit(
    id: u64,
    category: DepositCategory,
    status: DepositStatus,
    services: Vec<DepositService>,
) -> Deposit {
    Deposit {
        id: DepositId(id),
        category,
        status,
        disabled: false,
        deleted: false,
        services,
    }
}

pub(super) fn durations(rent: &str, sale: &str) -> Vec<ConfigEntry> {
    vec![
        ConfigEntry::new("site.title", "Listings"),
        ConfigEntry::new(DepositCategory::Rent.duration_key(), rent),
        ConfigEntry::new(DepositCategory::Sale.duration_key(), sale),
    ]
}

/// Rent 1 has a stale ad and gets archived; sale 2 has a fresh renewal and is
/// reinstated; rent 3 is already correct.
pub(super) fn seeded_store() -> InMemoryDepositStore {
    InMemoryDepositStore::new(
        vec![
            deposit(
                1,
                DepositCategory::Rent,
                DepositStatus::Accepted,
                vec![service(10, 1, ServiceType::RentalAdvertisement, 20, false)],
            ),
            deposit(
                2,
                DepositCategory::Sale,
                DepositStatus::SystemArchived,
                vec![service(20, 2, ServiceType::Renewal, 1, false)],
            ),
            deposit(
                3,
                DepositCategory::Rent,
                DepositStatus::Accepted,
                vec![service(30, 3, ServiceType::RentalAdvertisement, 2, false)],
            ),
        ],
        durations("10", "30"),
    )
}

/// Store whose sessions can fail a chosen partition load or the commit.
pub(super) struct FaultyStore {
    pub(super) inner: InMemoryDepositStore,
    pub(super) fail_category: Option<DepositCategory>,
    pub(super) panic_category: Option<DepositCategory>,
    pub(super) fail_commit: bool,
    pub(super) fail_configuration: bool,
}

impl FaultyStore {
    pub(super) fn new(inner: InMemoryDepositStore) -> Self {
        Self {
            inner,
            fail_category: None,
            panic_category: None,
            fail_commit: false,
            fail_configuration: false,
        }
    }
}

struct FaultySession {
    inner: Arc<dyn DepositSession>,
    fail_category: Option<DepositCategory>,
    panic_category: Option<DepositCategory>,
    fail_commit: bool,
    fail_configuration: bool,
}

#[async_trait]
impl DepositStore for FaultyStore {
    async fn open_session(&self) -> Result<Arc<dyn DepositSession>, RepositoryError> {
        let inner = self.inner.open_session().await?;
        Ok(Arc::new(FaultySession {
            inner,
            fail_category: self.fail_category,
            panic_category: self.panic_category,
            fail_commit: self.fail_commit,
            fail_configuration: self.fail_configuration,
        }))
    }
}

#[async_trait]
impl DepositSession for FaultySession {
    async fn load_deposits(&self, query: &CandidateQuery) -> Result<Vec<Deposit>, RepositoryError> {
        if self.panic_category == Some(query.category) {
            panic!("{} partition exploded", query.category);
        }
        if self.fail_category == Some(query.category) {
            // Let the other partition finish computing its changes first.
            tokio::task::yield_now().await;
            return Err(RepositoryError::Unavailable(format!(
                "{} query timed out",
                query.category
            )));
        }
        self.inner.load_deposits(query).await
    }

    async fn load_configuration(&self) -> Result<Vec<ConfigEntry>, RepositoryError> {
        if self.fail_configuration {
            return Err(RepositoryError::Unavailable("configuration table offline".to_string()));
        }
        self.inner.load_configuration().await
    }

    async fn commit(&self, changes: &[StatusChange]) -> Result<usize, RepositoryError> {
        if self.fail_commit {
            return Err(RepositoryError::Aborted("deadlock detected".to_string()));
        }
        self.inner.commit(changes).await
    }
}

/// Cache that can be switched offline or made to refuse run-marker writes.
#[derive(Default)]
pub(super) struct FlakyCache {
    inner: crate::workflows::archival::memory::InMemoryCache,
    offline: AtomicBool,
    refuse_marker_writes: AtomicBool,
}

impl FlakyCache {
    pub(super) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(super) fn refuse_marker_writes(&self, refuse: bool) {
        self.refuse_marker_writes.store(refuse, Ordering::SeqCst);
    }

    pub(super) fn value(&self, key: &str) -> Option<String> {
        self.inner.value(key)
    }
}

#[async_trait]
impl SharedCache for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("connection refused".to_string()));
        }
        if self.refuse_marker_writes.load(Ordering::SeqCst) && key.ends_with(":last-execute") {
            return Err(CacheError::Unavailable("write refused".to_string()));
        }
        self.inner.set(key, value).await
    }
}

/// Store whose deposit loads block until the test hands out a permit.
pub(super) struct GatedStore {
    pub(super) inner: InMemoryDepositStore,
    pub(super) gate: Arc<Semaphore>,
    pub(super) entered: Arc<Notify>,
}

impl GatedStore {
    pub(super) fn new(inner: InMemoryDepositStore) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            entered: Arc::new(Notify::new()),
        }
    }
}

struct GatedSession {
    inner: Arc<dyn DepositSession>,
    gate: Arc<Semaphore>,
    entered: Arc<Notify>,
}

#[async_trait]
impl DepositStore for GatedStore {
    async fn open_session(&self) -> Result<Arc<dyn DepositSession>, RepositoryError> {
        let inner = self.inner.open_session().await?;
        Ok(Arc::new(GatedSession {
            inner,
            gate: self.gate.clone(),
            entered: self.entered.clone(),
        }))
    }
}

#[async_trait]
impl DepositSession for GatedSession {
    async fn load_deposits(&self, query: &CandidateQuery) -> Result<Vec<Deposit>, RepositoryError> {
        self.entered.notify_one();
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| RepositoryError::Unavailable("gate closed".to_string()))?;
        self.inner.load_deposits(query).await
    }

    async fn load_configuration(&self) -> Result<Vec<ConfigEntry>, RepositoryError> {
        self.inner.load_configuration().await
    }

    async fn commit(&self, changes: &[StatusChange]) -> Result<usize, RepositoryError> {
        self.inner.commit(changes).await
    }
}
