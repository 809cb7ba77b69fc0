use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::repository::{CacheError, SharedCache};

/// Value stored under the run marker key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMarker {
    pub last_execute: NaiveDateTime,
}

/// Durable once-per-day marker for the archival job.
///
/// There is no locking: two instances racing past the check may both run on
/// the same day. That only costs a redundant pass since evaluation is
/// idempotent.
pub struct RunGuard {
    cache: Arc<dyn SharedCache>,
    key: String,
}

impl RunGuard {
    pub fn new(cache: Arc<dyn SharedCache>, job_name: &str) -> Self {
        Self {
            cache,
            key: format!("{job_name}:last-execute"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn last_run_date(&self) -> Result<Option<NaiveDate>, GuardError> {
        let Some(raw) = self.cache.get(&self.key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<RunMarker>(&raw) {
            Ok(marker) => Ok(Some(marker.last_execute.date())),
            Err(err) => {
                warn!(key = %self.key, error = %err, "ignoring unreadable run marker");
                Ok(None)
            }
        }
    }

    /// Record a successful run starting at `at`.
    pub async fn record(&self, at: NaiveDateTime) -> Result<(), GuardError> {
        let payload = serde_json::to_string(&RunMarker { last_execute: at })?;
        self.cache.set(&self.key, payload).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("run marker could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
