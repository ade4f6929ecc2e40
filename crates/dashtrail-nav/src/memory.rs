//! In-memory port implementations.
//!
//! Used by tests and the replay binary in place of a real browser.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use dashtrail_core::params::QueryParams;

use crate::ports::{Location, MessagingPort, NavigationPort, StorageError, StoragePort};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Location and history held in memory.
pub struct MemoryNavigation {
    location: Mutex<Location>,
    navigations: Mutex<Vec<String>>,
    replaced: Mutex<Vec<QueryParams>>,
    history: watch::Sender<u64>,
}

impl MemoryNavigation {
    pub fn new(location: Location) -> Self {
        let (history, _) = watch::channel(0);
        Self {
            location: Mutex::new(location),
            navigations: Mutex::new(Vec::new()),
            replaced: Mutex::new(Vec::new()),
            history,
        }
    }

    /// In-app route change: the location moves without a history pop.
    pub fn set_location(&self, location: Location) {
        *lock(&self.location) = location;
    }

    /// Native back/forward to `location`.
    pub fn pop_to(&self, location: Location) {
        *lock(&self.location) = location;
        self.history.send_modify(|generation| *generation += 1);
    }

    /// Every URL passed to `navigate_to`, in order.
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.navigations).clone()
    }

    /// Every query written through `replace_query`, in order.
    pub fn replaced_queries(&self) -> Vec<QueryParams> {
        lock(&self.replaced).clone()
    }
}

impl NavigationPort for MemoryNavigation {
    fn current_location(&self) -> Location {
        lock(&self.location).clone()
    }

    fn navigate_to(&self, url: &str) {
        lock(&self.navigations).push(url.to_string());
        if let Some(next) = Location::parse(url) {
            *lock(&self.location) = next;
        }
    }

    fn replace_query(&self, query: &QueryParams) {
        lock(&self.replaced).push(query.clone());
        lock(&self.location).query = query.clone();
    }

    fn on_history_change(&self) -> watch::Receiver<u64> {
        self.history.subscribe()
    }
}

/// Session storage held in a map. Reads and writes can be switched off to
/// simulate a blocked or full storage.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects every read and write.
    pub fn unavailable() -> Self {
        let storage = Self::default();
        storage.set_available(false);
        storage
    }

    pub fn with_item(self, key: &str, value: &str) -> Self {
        lock(&self.items).insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_available(&self, available: bool) {
        self.fail_reads.store(!available, Ordering::SeqCst);
        self.fail_writes.store(!available, Ordering::SeqCst);
    }

    pub fn set_writes_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing the failure switches.
    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }
}

impl StoragePort for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("session storage disabled".into()));
        }
        Ok(lock(&self.items).get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::QuotaExceeded(format!("cannot write {key}")));
        }
        lock(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Records posted messages.
#[derive(Default)]
pub struct MemoryMessaging {
    posted: Mutex<Vec<(serde_json::Value, String)>>,
}

impl MemoryMessaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<serde_json::Value> {
        lock(&self.posted).iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn target_origins(&self) -> Vec<String> {
        lock(&self.posted).iter().map(|(_, o)| o.clone()).collect()
    }

    pub fn count(&self) -> usize {
        lock(&self.posted).len()
    }
}

impl MessagingPort for MemoryMessaging {
    fn post_to_top(&self, message: serde_json::Value, target_origin: &str) {
        lock(&self.posted).push((message, target_origin.to_string()));
    }
}
