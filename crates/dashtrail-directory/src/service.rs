//! Directory client trait used by the controller to look up dashboards.

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::types::{DirectoryEntry, Org, SearchQuery};

/// The directory interface.
///
/// Callers treat an error or an empty result as "no match"; neither is
/// allowed to fail a page load.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Search dashboards. An unfiltered query lists everything up to the
    /// limit; an id-filtered query returns only the listed ids.
    async fn search(&self, query: SearchQuery) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    /// Look up the organization of the current session.
    async fn current_org(&self) -> Result<Org, DirectoryError>;
}
