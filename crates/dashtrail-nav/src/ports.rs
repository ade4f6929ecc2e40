//! Host ports: the only way the controller touches the location, session
//! storage, or the embedding window.

use tokio::sync::watch;
use url::Url;

use dashtrail_core::error::TrailError;
use dashtrail_core::params::{decode_params, encode_params, QueryParams};

/// The current address-bar location, split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Scheme, host and port, e.g. `https://grafana.example`.
    pub origin: String,
    pub path: String,
    pub query: QueryParams,
}

impl Location {
    pub fn new(origin: impl Into<String>, path: impl Into<String>, query: QueryParams) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            query,
        }
    }

    /// Split an absolute URL. Returns `None` for relative or invalid input.
    pub fn parse(href: &str) -> Option<Self> {
        let url = Url::parse(href).ok()?;
        if !url.has_host() {
            return None;
        }
        Some(Self {
            origin: url.origin().ascii_serialization(),
            path: url.path().to_string(),
            query: url.query().map(decode_params).unwrap_or_default(),
        })
    }

    pub fn href(&self) -> String {
        let query = encode_params(&self.query);
        if query.is_empty() {
            format!("{}{}", self.origin, self.path)
        } else {
            format!("{}{}?{}", self.origin, self.path, query)
        }
    }
}

/// Access to the browser location and history.
pub trait NavigationPort: Send + Sync {
    fn current_location(&self) -> Location;

    /// Leave the current page for `url` (full navigation).
    fn navigate_to(&self, url: &str);

    /// Rewrite the current history entry's query string without adding a
    /// new entry.
    fn replace_query(&self, query: &QueryParams);

    /// Feed of native back/forward navigations. The value is a counter that
    /// changes on every history pop.
    fn on_history_change(&self) -> watch::Receiver<u64>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl From<StorageError> for TrailError {
    fn from(err: StorageError) -> Self {
        TrailError::storage(err.to_string())
    }
}

/// Session-scoped key/value storage.
pub trait StoragePort: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Cross-window messaging to the embedding parent.
pub trait MessagingPort: Send + Sync {
    /// Post `message` to the top-level window. Fire-and-forget.
    fn post_to_top(&self, message: serde_json::Value, target_origin: &str);
}
