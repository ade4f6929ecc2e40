//! Navigation controller: reconciles the in-memory trail with the address
//! bar, session storage and the parent frame.
//!
//! Every resolution cycle runs in three steps. `begin` advances the request
//! token and captures a seed trail, `lookup` asks the directory for the
//! dashboard list and the current org (the only suspension point), and
//! `complete` applies the result. A completion whose token is no longer the
//! latest is dropped without touching any surface.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, warn};

use dashtrail_core::config::PanelOptions;
use dashtrail_core::error::TrailError;
use dashtrail_core::event::{
    TracingEventSink, TrailEvent, TrailEventKind, TrailEventOutcome, TrailEventSink,
};
use dashtrail_core::model::{dashboard_uid_from_path, BreadcrumbItem};
use dashtrail_core::params::{strip_control, QueryParams, ORG_ID_PARAM};
use dashtrail_core::store::BreadcrumbStore;
use dashtrail_core::url_sync::{resolve_tokens, tokens_from_query, with_breadcrumb};
use dashtrail_directory::service::DirectoryClient;
use dashtrail_directory::types::{find_by_uid, DirectoryEntry, SearchQuery};

use crate::persistence::PersistenceAdapter;
use crate::ports::{Location, MessagingPort, NavigationPort, StoragePort};
use crate::relay::{FrameMessage, FrameRelay};
use crate::state_machine::{transition, NavEvent, NavState};

pub const DEFAULT_SEARCH_LIMIT: usize = 1000;

/// How a resolution cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The lookup succeeded and all surfaces carry the new trail.
    Synced,
    /// The lookup failed; the previous trail was re-published unchanged.
    Degraded(TrailError),
    /// A newer cycle started first; nothing was applied.
    Superseded,
}

impl CycleOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

/// What the panel renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailView {
    pub items: Vec<BreadcrumbItem>,
    pub show_text: bool,
}

struct Inner {
    state: NavState,
    store: BreadcrumbStore,
    latest_token: u64,
    org_id: Option<String>,
}

impl Inner {
    fn advance(&mut self, event: NavEvent) -> u64 {
        self.latest_token += 1;
        let (next, changed) = transition(self.state, event);
        if changed {
            debug!(from = %self.state, to = %next, token = self.latest_token, "navigation state");
        }
        self.state = next;
        self.latest_token
    }

    fn settle(&mut self, event: NavEvent) {
        self.state = transition(self.state, event).0;
    }

    fn trail_ids(&self) -> Vec<String> {
        self.store.ids().into_iter().map(str::to_string).collect()
    }
}

struct Cycle {
    token: u64,
    kind: TrailEventKind,
    location: Location,
    /// URL tokens to rebuild the trail from when the lookup succeeds.
    tokens: Option<Vec<String>>,
    /// Trail used when there are no tokens or the lookup fails.
    fallback: Vec<BreadcrumbItem>,
}

struct Lookup {
    entries: Vec<DirectoryEntry>,
    org_id: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct NavigationController {
    panel: PanelOptions,
    search_limit: usize,
    directory: Arc<dyn DirectoryClient>,
    navigation: Arc<dyn NavigationPort>,
    persistence: PersistenceAdapter,
    relay: FrameRelay,
    events: Arc<dyn TrailEventSink>,
    history: Mutex<Option<watch::Receiver<u64>>>,
    inner: Mutex<Inner>,
}

impl NavigationController {
    pub fn new(
        panel: PanelOptions,
        directory: Arc<dyn DirectoryClient>,
        navigation: Arc<dyn NavigationPort>,
        storage: Arc<dyn StoragePort>,
        messaging: Arc<dyn MessagingPort>,
    ) -> Self {
        let history = navigation.on_history_change();
        let store = BreadcrumbStore::new(panel.breadcrumb_items_max_amount);
        Self {
            panel,
            search_limit: DEFAULT_SEARCH_LIMIT,
            directory,
            navigation,
            persistence: PersistenceAdapter::new(storage),
            relay: FrameRelay::new(messaging),
            events: Arc::new(TracingEventSink),
            history: Mutex::new(Some(history)),
            inner: Mutex::new(Inner {
                state: NavState::Init,
                store,
                latest_token: 0,
                org_id: None,
            }),
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn TrailEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn state(&self) -> NavState {
        lock(&self.inner).state
    }

    pub fn trail(&self) -> Vec<BreadcrumbItem> {
        lock(&self.inner).store.items().to_vec()
    }

    pub fn latest_token(&self) -> u64 {
        lock(&self.inner).latest_token
    }

    /// Org id from the most recent successful lookup.
    pub fn org_id(&self) -> Option<String> {
        lock(&self.inner).org_id.clone()
    }

    pub fn view(&self) -> TrailView {
        TrailView {
            items: self.trail(),
            show_text: self.panel.show_text(),
        }
    }

    /// First load of the panel. Seeds from the URL tokens when present,
    /// otherwise from session storage; a root dashboard starts empty.
    pub async fn mount(&self) -> CycleOutcome {
        let cycle = self.begin_mount();
        let lookup = self.lookup().await;
        self.complete(cycle, lookup)
    }

    /// In-app route change. Forwards any relay target, then resolves the new
    /// location against the in-memory trail.
    pub async fn route_changed(&self) -> CycleOutcome {
        let location = self.navigation.current_location();
        if let Some(message) = self.relay.relay_target(&location.query) {
            let inner = lock(&self.inner);
            self.events.record(TrailEvent::new(
                inner.latest_token,
                TrailEventKind::RelayTarget,
                TrailEventOutcome::Navigated,
                inner.trail_ids(),
                message.to_string(),
            ));
        }
        let cycle = {
            let mut inner = lock(&self.inner);
            let token = inner.advance(NavEvent::RouteChanged);
            Cycle {
                token,
                kind: TrailEventKind::RouteChange,
                location,
                tokens: None,
                fallback: inner.store.items().to_vec(),
            }
        };
        let lookup = self.lookup().await;
        self.complete(cycle, lookup)
    }

    /// Native back/forward. The URL token list is authoritative.
    pub async fn history_popped(&self) -> CycleOutcome {
        let cycle = self.begin_pop();
        let lookup = self.lookup().await;
        self.complete(cycle, lookup)
    }

    /// Jump back to the ancestor `id`. Returns the destination URL, or
    /// `None` when `id` is not on the trail.
    pub fn navigate_to_crumb(&self, id: &str) -> Option<String> {
        let mut inner = lock(&self.inner);
        let item = inner.store.get(id)?.clone();
        let token = inner.advance(NavEvent::CrumbClicked);
        let removed = inner.store.truncate_after(id);
        debug!(token, id, removed, "truncated trail after clicked crumb");

        if let Err(err) = self.persistence.save(inner.store.items()) {
            warn!(token, error = %err, "could not persist trail; continuing without storage");
        }

        let location = self.navigation.current_location();
        let destination = item.destination(&location.origin);
        self.navigation.navigate_to(&destination);

        let org_id = inner
            .org_id
            .clone()
            .or_else(|| location.query.get(ORG_ID_PARAM).cloned())
            .unwrap_or_default();
        self.relay.notify(&FrameMessage::new(
            item.id.as_str(),
            inner.store.items(),
            org_id,
            &item.query_params,
        ));

        self.events.record(TrailEvent::new(
            token,
            TrailEventKind::CrumbClick,
            TrailEventOutcome::Navigated,
            inner.trail_ids(),
            destination.clone(),
        ));
        Some(destination)
    }

    /// Run `history_popped` for every native back/forward until the
    /// navigation port closes its change feed.
    pub async fn watch_history(&self) {
        let feed = lock(&self.history).take();
        let Some(mut feed) = feed else {
            warn!("history feed is already being watched");
            return;
        };
        while feed.changed().await.is_ok() {
            let outcome = self.history_popped().await;
            debug!(?outcome, "history pop handled");
        }
    }

    fn begin_mount(&self) -> Cycle {
        let location = self.navigation.current_location();
        let mut inner = lock(&self.inner);
        let token = inner.advance(NavEvent::Mount);

        if self.panel.is_root_dashboard {
            inner.store.clear();
            debug!(token, "root dashboard mounted; trail reset");
            return Cycle {
                token,
                kind: TrailEventKind::Mount,
                location,
                tokens: None,
                fallback: Vec::new(),
            };
        }

        if let Err(err) = self.persistence.initialize() {
            debug!(token, error = %err, "could not initialize session trail");
        }
        let persisted = self.load_persisted(token);
        let tokens = match tokens_from_query(&location.query) {
            Some(Ok(tokens)) => Some(tokens),
            Some(Err(err)) => {
                warn!(token, error = %err, "ignoring breadcrumb parameter; using session trail");
                None
            }
            None => None,
        };
        Cycle {
            token,
            kind: TrailEventKind::Mount,
            location,
            tokens,
            fallback: persisted,
        }
    }

    fn begin_pop(&self) -> Cycle {
        let location = self.navigation.current_location();
        let mut inner = lock(&self.inner);
        let token = inner.advance(NavEvent::HistoryPopped);
        let current = inner.store.items().to_vec();

        let (tokens, fallback) = match tokens_from_query(&location.query) {
            Some(Ok(tokens)) => (Some(tokens), current),
            Some(Err(err)) => {
                warn!(token, error = %err, "ignoring breadcrumb parameter; using session trail");
                match self.persistence.load() {
                    Ok(items) => (None, items),
                    Err(err) => {
                        warn!(token, error = %err, "session trail unavailable; keeping current trail");
                        (None, current)
                    }
                }
            }
            // The restored entry carries no trail; seed empty so only the
            // current dashboard remains.
            None => (Some(Vec::new()), current),
        };
        Cycle {
            token,
            kind: TrailEventKind::HistoryPop,
            location,
            tokens,
            fallback,
        }
    }

    fn load_persisted(&self, token: u64) -> Vec<BreadcrumbItem> {
        match self.persistence.load() {
            Ok(items) => items,
            Err(err) => {
                warn!(token, error = %err, "session trail unavailable; starting empty");
                Vec::new()
            }
        }
    }

    async fn lookup(&self) -> Result<Lookup, TrailError> {
        let query = SearchQuery::unfiltered().with_limit(self.search_limit);
        let entries = self
            .directory
            .search(query)
            .await
            .map_err(|err| TrailError::upstream(format!("dashboard search: {err}")))?;
        let org = self
            .directory
            .current_org()
            .await
            .map_err(|err| TrailError::upstream(format!("org lookup: {err}")))?;
        Ok(Lookup {
            entries,
            org_id: org.id.to_string(),
        })
    }

    fn complete(&self, cycle: Cycle, lookup: Result<Lookup, TrailError>) -> CycleOutcome {
        let mut inner = lock(&self.inner);
        if cycle.token != inner.latest_token {
            debug!(
                token = cycle.token,
                latest = inner.latest_token,
                kind = %cycle.kind,
                "discarding stale completion"
            );
            self.events.record(TrailEvent::new(
                cycle.token,
                cycle.kind,
                TrailEventOutcome::Superseded,
                inner.trail_ids(),
                format!("superseded by cycle {}", inner.latest_token),
            ));
            return CycleOutcome::Superseded;
        }

        let Cycle {
            token,
            kind,
            location,
            tokens,
            fallback,
        } = cycle;

        let lookup = match lookup {
            Ok(lookup) => lookup,
            Err(err) => {
                inner.store.replace_all(fallback);
                inner.settle(NavEvent::LookupFailed);
                self.publish(token, inner.store.items(), &location);
                self.events.record(TrailEvent::new(
                    token,
                    kind,
                    TrailEventOutcome::Degraded(err.to_string()),
                    inner.trail_ids(),
                    "previous trail re-published",
                ));
                return CycleOutcome::Degraded(err);
            }
        };

        let seeded = match tokens {
            Some(tokens) => resolve_tokens(&tokens, |uid| {
                let entry = find_by_uid(&lookup.entries, uid)?;
                let params = fallback
                    .iter()
                    .find(|known| known.id == entry.id)
                    .map(|known| known.query_params.clone())
                    .unwrap_or_else(|| org_params(&lookup.org_id));
                Some(BreadcrumbItem::new(
                    entry.id.as_str(),
                    entry.path.as_str(),
                    entry.title.as_str(),
                    params,
                    &location.origin,
                ))
            }),
            None => fallback,
        };
        inner.store.replace_all(seeded);

        let current = current_item(&location, &lookup);
        let detail = match &current {
            Ok(item) => {
                inner.store.upsert_current(item.clone());
                format!("current dashboard {}", item.id)
            }
            Err(err) => {
                debug!(token, error = %err, "current dashboard not in directory; trail left as is");
                err.to_string()
            }
        };
        let evicted = inner.store.evict_if_overflow();
        if !evicted.is_empty() {
            debug!(token, evicted = evicted.len(), "evicted oldest breadcrumbs");
        }

        inner.settle(NavEvent::LookupSucceeded);
        inner.org_id = Some(lookup.org_id.clone());
        self.publish(token, inner.store.items(), &location);
        if let Ok(item) = &current {
            self.relay.notify(&FrameMessage::new(
                item.id.as_str(),
                inner.store.items(),
                lookup.org_id.as_str(),
                &location.query,
            ));
        }

        self.events.record(TrailEvent::new(
            token,
            kind,
            TrailEventOutcome::Synced,
            inner.trail_ids(),
            detail,
        ));
        CycleOutcome::Synced
    }

    /// Write `items` to storage, then to the address bar.
    fn publish(&self, token: u64, items: &[BreadcrumbItem], location: &Location) {
        if let Err(err) = self.persistence.save(items) {
            warn!(token, error = %err, "could not persist trail; continuing without storage");
        }
        self.navigation
            .replace_query(&with_breadcrumb(&location.query, items));
    }
}

fn org_params(org_id: &str) -> QueryParams {
    let mut params = QueryParams::new();
    if !org_id.is_empty() {
        params.insert(ORG_ID_PARAM.to_string(), org_id.to_string());
    }
    params
}

/// The item for the dashboard at `location`, with its domain parameters.
fn current_item(location: &Location, lookup: &Lookup) -> Result<BreadcrumbItem, TrailError> {
    let uid = dashboard_uid_from_path(&location.path).unwrap_or_default();
    let entry = find_by_uid(&lookup.entries, uid).ok_or_else(|| TrailError::NotFound {
        id: uid.to_string(),
    })?;
    let mut params = strip_control(&location.query);
    let org_id = location
        .query
        .get(ORG_ID_PARAM)
        .filter(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| lookup.org_id.clone());
    if !org_id.is_empty() {
        params.insert(ORG_ID_PARAM.to_string(), org_id);
    }
    Ok(BreadcrumbItem::new(
        entry.id.as_str(),
        entry.path.as_str(),
        entry.title.as_str(),
        params,
        &location.origin,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(ids: &[&str]) -> Lookup {
        Lookup {
            entries: ids
                .iter()
                .map(|id| DirectoryEntry::new(*id, id.to_uppercase(), format!("/d/{id}/slug")))
                .collect(),
            org_id: "1".into(),
        }
    }

    #[test]
    fn current_item_keeps_domain_params_and_org() {
        let mut query = QueryParams::new();
        query.insert("breadcrumb".into(), "a,b".into());
        query.insert("from".into(), "now-6h".into());
        let location = Location::new("http://h", "/d/b/slug", query);
        let item = match current_item(&location, &lookup(&["a", "b"])) {
            Ok(item) => item,
            Err(err) => panic!("expected a match: {err}"),
        };
        assert_eq!(item.id, "b");
        assert_eq!(item.display_name, "B");
        assert_eq!(item.query_params.get("from").map(String::as_str), Some("now-6h"));
        assert_eq!(item.query_params.get("orgId").map(String::as_str), Some("1"));
        assert!(!item.query_params.contains_key("breadcrumb"));
        assert_eq!(item.resolved_url, "http://h/d/b/slug?from=now-6h&orgId=1");
    }

    #[test]
    fn current_item_prefers_org_from_location() {
        let mut query = QueryParams::new();
        query.insert("orgId".into(), "4".into());
        let location = Location::new("http://h", "/d/a/slug", query);
        let item = current_item(&location, &lookup(&["a"])).ok();
        assert_eq!(
            item.and_then(|i| i.query_params.get("orgId").cloned()).as_deref(),
            Some("4")
        );
    }

    #[test]
    fn unknown_current_dashboard_is_not_found() {
        let location = Location::new("http://h", "/d/zzz/slug", QueryParams::new());
        assert!(matches!(
            current_item(&location, &lookup(&["a"])),
            Err(TrailError::NotFound { ref id }) if id == "zzz"
        ));
        let home = Location::new("http://h", "/", QueryParams::new());
        assert!(current_item(&home, &lookup(&["a"])).is_err());
    }

    #[test]
    fn org_params_skip_empty_org() {
        assert!(org_params("").is_empty());
        assert_eq!(org_params("2").get("orgId").map(String::as_str), Some("2"));
    }
}
