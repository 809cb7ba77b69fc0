use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use async_trait::async_trait;

use super::domain::{CandidateQuery, ConfigEntry, Deposit, DepositId, StatusChange};
use super::repository::{CacheError, DepositSession, DepositStore, RepositoryError, SharedCache};

#[derive(Debug, Default)]
struct StoreState {
    deposits: BTreeMap<DepositId, Deposit>,
    configuration: Vec<ConfigEntry>,
}

/// Process-local deposit store used by the worker demo and the test-suite.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDepositStore {
    state: Arc<Mutex<StoreState>>,
    sessions_opened: Arc<AtomicUsize>,
}

impl InMemoryDepositStore {
    pub fn new(deposits: impl IntoIterator<Item = Deposit>, configuration: Vec<ConfigEntry>) -> Self {
        let deposits = deposits
            .into_iter()
            .map(|deposit| (deposit.id, deposit))
            .collect();

        Self {
            state: Arc::new(Mutex::new(StoreState {
                deposits,
                configuration,
            })),
            sessions_opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn insert(&self, deposit: Deposit) {
        lock_or_recover(&self.state)
            .deposits
            .insert(deposit.id, deposit);
    }

    pub fn deposit(&self, id: DepositId) -> Option<Deposit> {
        lock_or_recover(&self.state).deposits.get(&id).cloned()
    }

    pub fn deposits(&self) -> Vec<Deposit> {
        lock_or_recover(&self.state).deposits.values().cloned().collect()
    }

    pub fn set_configuration(&self, configuration: Vec<ConfigEntry>) {
        lock_or_recover(&self.state).configuration = configuration;
    }

    /// Number of sessions handed out so far, one per attempted run.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

fn lock_or_recover(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl DepositStore for InMemoryDepositStore {
    async fn open_session(&self) -> Result<Arc<dyn DepositSession>, RepositoryError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemorySession {
            state: self.state.clone(),
        }))
    }
}

struct InMemorySession {
    state: Arc<Mutex<StoreState>>,
}

impl InMemorySession {
    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("deposit store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl DepositSession for InMemorySession {
    async fn load_deposits(&self, query: &CandidateQuery) -> Result<Vec<Deposit>, RepositoryError> {
        let guard = self.state()?;
        Ok(guard
            .deposits
            .values()
            .filter(|deposit| query.matches(deposit))
            .cloned()
            .collect())
    }

    async fn load_configuration(&self) -> Result<Vec<ConfigEntry>, RepositoryError> {
        Ok(self.state()?.configuration.clone())
    }

    /// Validates every change against the stored status before applying any,
    /// so a stale or unknown deposit aborts the whole batch.
    async fn commit(&self, changes: &[StatusChange]) -> Result<usize, RepositoryError> {
        let mut guard = self.state()?;

        for change in changes {
            let stored = guard
                .deposits
                .get(&change.deposit_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("deposit {}", change.deposit_id.0)))?;
            if stored.status != change.from {
                return Err(RepositoryError::Aborted(format!(
                    "deposit {} changed from {} to {} during the run",
                    change.deposit_id.0,
                    change.from.label(),
                    stored.status.label()
                )));
            }
        }

        for change in changes {
            if let Some(deposit) = guard.deposits.get_mut(&change.deposit_id) {
                deposit.status = change.to;
            }
        }

        Ok(changes.len())
    }
}

/// Process-local stand-in for the shared key-value cache.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCache {
    /// Drop a key, the way an external eviction would.
    pub fn evict(&self, key: &str) {
        if let Ok(mut guard) = self.entries.write() {
            guard.remove(key);
        }
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|guard| guard.get(key).cloned())
    }
}

#[async_trait]
impl SharedCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let guard = self
            .entries
            .read()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }
}
