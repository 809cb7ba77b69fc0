use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::task::JoinError;
use tracing::{debug, warn};

use super::decision::plan_change;
use super::domain::{DepositCategory, PartitionSummary, StatusChange};
use super::durations::DisplayDurations;
use super::job::ArchivalError;
use super::loader::load_candidates;
use super::repository::DepositSession;

/// Changes computed for one category partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutcome {
    pub category: DepositCategory,
    pub summary: PartitionSummary,
    pub changes: Vec<StatusChange>,
}

/// Both partitions of a run, ready to be committed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionResults {
    pub rent: PartitionOutcome,
    pub sale: PartitionOutcome,
}

impl PartitionResults {
    pub fn changes(&self) -> Vec<StatusChange> {
        self.rent
            .changes
            .iter()
            .chain(self.sale.changes.iter())
            .copied()
            .collect()
    }
}

/// Load and evaluate a single partition.
pub async fn evaluate_partition(
    session: Arc<dyn DepositSession>,
    category: DepositCategory,
    cutoff: NaiveDateTime,
) -> Result<PartitionOutcome, ArchivalError> {
    let deposits = load_candidates(session.as_ref(), category)
        .await
        .map_err(ArchivalError::Retrieval)?;

    let changes: Vec<StatusChange> = deposits
        .iter()
        .filter_map(|deposit| plan_change(deposit, cutoff))
        .collect();

    let archived = changes.iter().filter(|change| change.archives()).count();
    let summary = PartitionSummary {
        evaluated: deposits.len(),
        archived,
        reinstated: changes.len() - archived,
    };

    debug!(%category, %cutoff, ?summary, "partition evaluated");

    Ok(PartitionOutcome {
        category,
        summary,
        changes,
    })
}

/// Evaluate the rent and sale partitions concurrently.
///
/// Both tasks are always awaited; if either fails the whole run fails and no
/// partial result is handed back.
pub async fn evaluate_partitions(
    session: Arc<dyn DepositSession>,
    durations: DisplayDurations,
    now: NaiveDateTime,
) -> Result<PartitionResults, ArchivalError> {
    let rent = tokio::spawn(evaluate_partition(
        session.clone(),
        DepositCategory::Rent,
        durations.cutoff(DepositCategory::Rent, now),
    ));
    let sale = tokio::spawn(evaluate_partition(
        session,
        DepositCategory::Sale,
        durations.cutoff(DepositCategory::Sale, now),
    ));

    let (rent, sale) = tokio::join!(rent, sale);

    match (
        settle(DepositCategory::Rent, rent),
        settle(DepositCategory::Sale, sale),
    ) {
        (Ok(rent), Ok(sale)) => Ok(PartitionResults { rent, sale }),
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(err),
        (Err(first), Err(second)) => {
            warn!(
                category = %DepositCategory::Sale,
                error = %second,
                "sale partition also failed"
            );
            Err(first)
        }
    }
}

fn settle(
    category: DepositCategory,
    joined: Result<Result<PartitionOutcome, ArchivalError>, JoinError>,
) -> Result<PartitionOutcome, ArchivalError> {
    match joined {
        Ok(outcome) => outcome,
        Err(err) => Err(ArchivalError::Partition {
            category,
            reason: if err.is_panic() {
                "evaluation task panicked".to_string()
            } else {
                err.to_string()
            },
        }),
    }
}
