use std::sync::Arc;

use async_trait::async_trait;

use super::domain::{CandidateQuery, ConfigEntry, Deposit, StatusChange};

/// Source of per-run storage sessions. A session is opened at the start of a
/// run and dropped when the run ends, whatever the outcome.
#[async_trait]
pub trait DepositStore: Send + Sync {
    async fn open_session(&self) -> Result<Arc<dyn DepositSession>, RepositoryError>;
}

/// Storage operations available to one reconciliation run.
#[async_trait]
pub trait DepositSession: Send + Sync {
    /// Deposits matching the query with their services already attached.
    async fn load_deposits(&self, query: &CandidateQuery) -> Result<Vec<Deposit>, RepositoryError>;

    /// The full shared configuration set.
    async fn load_configuration(&self) -> Result<Vec<ConfigEntry>, RepositoryError>;

    /// Apply every change in a single transaction; either all land or none do.
    async fn commit(&self, changes: &[StatusChange]) -> Result<usize, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("transaction aborted: {0}")]
    Aborted(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Shared key-value cache used for the duration lookup and the run marker.
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
}

/// Cache transport failure.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}
