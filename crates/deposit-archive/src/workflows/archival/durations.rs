use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use super::domain::{ConfigEntry, DepositCategory};
use super::job::ArchivalError;
use super::repository::{DepositSession, SharedCache};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Display durations, in days, for both listing categories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayDurations {
    pub rent_days: f64,
    pub sale_days: f64,
}

impl DisplayDurations {
    pub fn days(&self, category: DepositCategory) -> f64 {
        match category {
            DepositCategory::Rent => self.rent_days,
            DepositCategory::Sale => self.sale_days,
        }
    }

    /// Oldest qualifying-service creation time still considered visible.
    pub fn cutoff(&self, category: DepositCategory, now: NaiveDateTime) -> NaiveDateTime {
        let millis = (self.days(category) * MILLIS_PER_DAY).round() as i64;
        now.checked_sub_signed(Duration::milliseconds(millis))
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Resolve both categories from a configuration set.
    pub fn from_entries(entries: &[ConfigEntry]) -> Result<Self, DurationError> {
        Ok(Self {
            rent_days: parse_days(entries, DepositCategory::Rent)?,
            sale_days: parse_days(entries, DepositCategory::Sale)?,
        })
    }
}

fn parse_days(entries: &[ConfigEntry], category: DepositCategory) -> Result<f64, DurationError> {
    let entry = entries
        .iter()
        .find(|entry| entry.key == category.duration_key())
        .ok_or(DurationError::Missing { category })?;

    let raw = entry.display_title.trim();
    match raw.parse::<f64>() {
        Ok(days) if days.is_finite() && days >= 0.0 => Ok(days),
        _ => Err(DurationError::Unparseable {
            category,
            value: entry.display_title.clone(),
        }),
    }
}

/// Configuration failure that makes a run impossible.
#[derive(Debug, thiserror::Error)]
pub enum DurationError {
    #[error("display duration for {category} listings is not configured")]
    Missing { category: DepositCategory },
    #[error("display duration for {category} listings is not a day count: {value:?}")]
    Unparseable {
        category: DepositCategory,
        value: String,
    },
}

/// Read-through cache over the shared configuration set.
///
/// The cached payload is the raw configuration set as JSON; it never expires
/// from here and is only refreshed after an external eviction.
pub struct DurationCache {
    cache: Arc<dyn SharedCache>,
    key: String,
}

impl DurationCache {
    pub fn new(cache: Arc<dyn SharedCache>, job_name: &str) -> Self {
        Self {
            cache,
            key: format!("{job_name}:display-durations"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn durations(
        &self,
        session: &dyn DepositSession,
    ) -> Result<DisplayDurations, ArchivalError> {
        let entries = match self.cached_entries().await {
            Some(entries) => entries,
            None => {
                let entries = session
                    .load_configuration()
                    .await
                    .map_err(ArchivalError::Retrieval)?;
                self.populate(&entries).await;
                entries
            }
        };

        Ok(DisplayDurations::from_entries(&entries)?)
    }

    async fn cached_entries(&self) -> Option<Vec<ConfigEntry>> {
        let raw = match self.cache.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "duration cache miss");
                return None;
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "duration cache read failed; using store");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(err) => {
                warn!(key = %self.key, error = %err, "cached configuration set is unreadable; reloading");
                None
            }
        }
    }

    async fn populate(&self, entries: &[ConfigEntry]) {
        let payload = match serde_json::to_string(entries) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "unable to encode configuration set for cache");
                return;
            }
        };

        if let Err(err) = self.cache.set(&self.key, payload).await {
            warn!(key = %self.key, error = %err, "duration cache write failed");
        }
    }
}
