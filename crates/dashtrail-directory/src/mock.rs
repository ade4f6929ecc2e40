//! Mock directory client for unit testing and offline replays.
//!
//! Serves a fixed set of entries, records every call, and can be told to
//! fail or stall specific calls.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::DirectoryError;
use crate::service::DirectoryClient;
use crate::types::{DirectoryEntry, Org, OrgId, SearchQuery};

/// A recorded call to the mock directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Search(SearchQuery),
    CurrentOrg,
}

/// Directory contents loaded from JSON, e.g.
/// `{"org": 1, "dashboards": [{"id": "a", "title": "A", "path": "/d/a/x"}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryFixture {
    pub org: OrgId,
    #[serde(default)]
    pub dashboards: Vec<DirectoryEntry>,
}

impl DirectoryFixture {
    pub fn from_json(text: &str) -> Result<Self, DirectoryError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Mock implementation of `DirectoryClient` for testing.
pub struct MockDirectoryClient {
    entries: Mutex<Vec<DirectoryEntry>>,
    org: Mutex<Org>,
    calls: Mutex<Vec<MockCall>>,
    search_error: Mutex<Option<DirectoryError>>,
    search_failure: Mutex<Option<DirectoryError>>,
    org_error: Mutex<Option<DirectoryError>>,
    search_delays: Mutex<VecDeque<Duration>>,
}

impl Default for MockDirectoryClient {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MockDirectoryClient {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            org: Mutex::new(Org {
                id: OrgId::Number(1),
                name: "Main Org.".into(),
            }),
            calls: Mutex::new(Vec::new()),
            search_error: Mutex::new(None),
            search_failure: Mutex::new(None),
            org_error: Mutex::new(None),
            search_delays: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_fixture(fixture: DirectoryFixture) -> Self {
        let mock = Self::new().with_entries(fixture.dashboards);
        *lock(&mock.org) = Org {
            id: fixture.org,
            name: String::new(),
        };
        mock
    }

    /// Add a dashboard with the conventional `/d/<id>/<slug>` path.
    pub fn with_dashboard(self, id: &str, title: &str) -> Self {
        let slug = title.to_lowercase().replace(' ', "-");
        lock(&self.entries).push(DirectoryEntry::new(id, title, format!("/d/{id}/{slug}")));
        self
    }

    pub fn with_entries(self, entries: Vec<DirectoryEntry>) -> Self {
        lock(&self.entries).extend(entries);
        self
    }

    pub fn with_org(self, id: OrgId) -> Self {
        lock(&self.org).id = id;
        self
    }

    /// Fail the next search only.
    pub fn with_search_error(self, err: DirectoryError) -> Self {
        *lock(&self.search_error) = Some(err);
        self
    }

    /// Fail every search until `set_search_failure(None)`.
    pub fn with_search_failure(self, err: DirectoryError) -> Self {
        *lock(&self.search_failure) = Some(err);
        self
    }

    /// Fail the next org lookup only.
    pub fn with_org_error(self, err: DirectoryError) -> Self {
        *lock(&self.org_error) = Some(err);
        self
    }

    /// Delay successive searches by these durations, in call order.
    pub fn with_search_delays(self, delays: Vec<Duration>) -> Self {
        lock(&self.search_delays).extend(delays);
        self
    }

    pub fn set_search_failure(&self, err: Option<DirectoryError>) {
        *lock(&self.search_failure) = err;
    }

    pub fn remove_dashboard(&self, id: &str) {
        lock(&self.entries).retain(|entry| entry.id != id);
    }

    /// Return all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Return the number of recorded calls.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl DirectoryClient for MockDirectoryClient {
    async fn search(&self, query: SearchQuery) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        self.record(MockCall::Search(query.clone()));

        let delay = lock(&self.search_delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = lock(&self.search_error).take() {
            return Err(err);
        }
        if let Some(err) = lock(&self.search_failure).clone() {
            return Err(err);
        }

        let entries = lock(&self.entries);
        let matching = entries
            .iter()
            .filter(|entry| !query.is_filtered() || query.ids.contains(&entry.id))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }

    async fn current_org(&self) -> Result<Org, DirectoryError> {
        self.record(MockCall::CurrentOrg);

        if let Some(err) = lock(&self.org_error).take() {
            return Err(err);
        }
        Ok(lock(&self.org).clone())
    }
}
