use tracing::{debug, warn};

use super::domain::{CandidateQuery, Deposit, DepositCategory};
use super::repository::{DepositSession, RepositoryError};

/// Load one partition of candidate deposits with their services attached.
///
/// The store is trusted to apply the query, but anything it returns outside
/// the query is dropped so the decision engine only ever sees candidates.
pub async fn load_candidates(
    session: &dyn DepositSession,
    category: DepositCategory,
) -> Result<Vec<Deposit>, RepositoryError> {
    let query = CandidateQuery::for_category(category);
    let deposits = session.load_deposits(&query).await?;
    let fetched = deposits.len();

    let candidates: Vec<Deposit> = deposits
        .into_iter()
        .filter(|deposit| query.matches(deposit))
        .collect();

    if candidates.len() != fetched {
        warn!(
            %category,
            fetched,
            kept = candidates.len(),
            "store returned deposits outside the candidate query"
        );
    }

    debug!(%category, candidates = candidates.len(), "loaded candidate deposits");
    Ok(candidates)
}
