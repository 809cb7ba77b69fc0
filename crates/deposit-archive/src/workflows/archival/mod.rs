//! Daily system-archive reconciliation for listing deposits.
//!
//! A run resolves the display durations, evaluates the rent and sale
//! partitions concurrently, and commits every status change in one write.
//! The scheduler gates runs behind a once-per-day marker in the shared cache.

pub mod clock;
pub mod decision;
pub mod domain;
pub mod durations;
pub mod executor;
pub mod guard;
pub mod job;
pub mod loader;
pub mod memory;
pub mod repository;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decision::{plan_change, qualifying_service, target_status};
pub use domain::{
    CandidateQuery, ConfigEntry, Deposit, DepositCategory, DepositId, DepositService,
    DepositServiceId, DepositStatus, PartitionSummary, RunReport, ServiceType, StatusChange,
};
pub use durations::{DisplayDurations, DurationCache, DurationError};
pub use executor::{evaluate_partition, evaluate_partitions, PartitionOutcome, PartitionResults};
pub use guard::{GuardError, RunGuard, RunMarker};
pub use job::{ArchivalError, ArchivalJob};
pub use loader::load_candidates;
pub use memory::{InMemoryCache, InMemoryDepositStore};
pub use repository::{CacheError, DepositSession, DepositStore, RepositoryError, SharedCache};
pub use scheduler::{ArchiveScheduler, RunFailure, SchedulePolicy, SkipReason, TickOutcome};
