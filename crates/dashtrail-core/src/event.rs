//! Trail event recording for audit and debugging.
//!
//! Every controller cycle emits one `TrailEvent`. Sinks can keep them in
//! memory, forward them to `tracing`, or drop them.

use chrono::{DateTime, Utc};

/// The trigger that started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrailEventKind {
    Mount,
    RouteChange,
    HistoryPop,
    CrumbClick,
    RelayTarget,
}

impl std::fmt::Display for TrailEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Mount => "mount",
            Self::RouteChange => "route_change",
            Self::HistoryPop => "history_pop",
            Self::CrumbClick => "crumb_click",
            Self::RelayTarget => "relay_target",
        };
        f.write_str(s)
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailEventOutcome {
    /// New trail published to storage, URL and frame.
    Synced,
    /// Lookup failed; the prior trail was re-published unchanged.
    Degraded(String),
    /// A newer cycle started first; nothing was applied.
    Superseded,
    /// A user jump was carried out.
    Navigated,
}

impl std::fmt::Display for TrailEventOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synced => f.write_str("synced"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Superseded => f.write_str("superseded"),
            Self::Navigated => f.write_str("navigated"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrailEvent {
    pub timestamp: DateTime<Utc>,
    pub request_token: u64,
    pub kind: TrailEventKind,
    pub outcome: TrailEventOutcome,
    pub trail: Vec<String>,
    pub detail: String,
}

impl TrailEvent {
    pub fn new(
        request_token: u64,
        kind: TrailEventKind,
        outcome: TrailEventOutcome,
        trail: Vec<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            request_token,
            kind,
            outcome,
            trail,
            detail: detail.into(),
        }
    }
}

/// Receiver of trail events.
pub trait TrailEventSink: Send + Sync {
    fn record(&self, event: TrailEvent);
}

/// In-memory event sink for testing.
#[derive(Default)]
pub struct InMemoryEventSink {
    events: std::sync::Mutex<Vec<TrailEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TrailEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        match self.events.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl TrailEventSink for InMemoryEventSink {
    fn record(&self, event: TrailEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Forwards events to `tracing` at info level (warn for degraded cycles).
pub struct TracingEventSink;

impl TrailEventSink for TracingEventSink {
    fn record(&self, event: TrailEvent) {
        let trail = event.trail.join(",");
        match &event.outcome {
            TrailEventOutcome::Degraded(reason) => tracing::warn!(
                token = event.request_token,
                kind = %event.kind,
                trail = %trail,
                reason = %reason,
                "trail cycle degraded"
            ),
            outcome => tracing::info!(
                token = event.request_token,
                kind = %event.kind,
                outcome = %outcome,
                trail = %trail,
                detail = %event.detail,
                "trail cycle finished"
            ),
        }
    }
}

/// No-op event sink that discards all events.
pub struct NullEventSink;

impl TrailEventSink for NullEventSink {
    fn record(&self, _event: TrailEvent) {}
}
