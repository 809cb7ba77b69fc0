use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::domain::{DepositCategory, RunReport};
use super::durations::{DurationCache, DurationError};
use super::executor::evaluate_partitions;
use super::repository::{DepositStore, RepositoryError, SharedCache};

/// One reconciliation pass: durations, both partitions, then a single commit.
pub struct ArchivalJob {
    store: Arc<dyn DepositStore>,
    durations: DurationCache,
}

impl ArchivalJob {
    pub fn new(store: Arc<dyn DepositStore>, cache: Arc<dyn SharedCache>, job_name: &str) -> Self {
        Self {
            store,
            durations: DurationCache::new(cache, job_name),
        }
    }

    /// Run the pipeline once. Nothing is written unless both partitions
    /// evaluate successfully.
    pub async fn execute(&self, now: NaiveDateTime) -> Result<RunReport, ArchivalError> {
        let session = self
            .store
            .open_session()
            .await
            .map_err(ArchivalError::Retrieval)?;

        let durations = self.durations.durations(session.as_ref()).await?;
        debug!(
            rent_days = durations.rent_days,
            sale_days = durations.sale_days,
            "display durations resolved"
        );

        let results = evaluate_partitions(session.clone(), durations, now).await?;
        let changes = results.changes();

        let committed = if changes.is_empty() {
            0
        } else {
            session
                .commit(&changes)
                .await
                .map_err(ArchivalError::Commit)?
        };

        let report = RunReport {
            rent: results.rent.summary,
            sale: results.sale.summary,
            committed,
        };

        info!(
            evaluated = report.evaluated(),
            rent_archived = report.rent.archived,
            rent_reinstated = report.rent.reinstated,
            sale_archived = report.sale.archived,
            sale_reinstated = report.sale.reinstated,
            committed,
            "deposit archival run committed"
        );

        Ok(report)
    }
}

/// Failure of a reconciliation run. Every variant aborts the run before any
/// status is written, except `Commit`, where the store rolls back.
#[derive(Debug, thiserror::Error)]
pub enum ArchivalError {
    #[error("configuration error: {0}")]
    Configuration(#[from] DurationError),
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] RepositoryError),
    #[error("{category} partition failed: {reason}")]
    Partition {
        category: DepositCategory,
        reason: String,
    },
    #[error("commit failed: {0}")]
    Commit(#[source] RepositoryError),
}
