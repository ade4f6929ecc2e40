//! Directory domain types, decoupled from the HTTP wire format.

use serde::{Deserialize, Serialize};

/// Dashboard metadata returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Opaque dashboard id (uid).
    pub id: String,
    pub title: String,
    /// Canonical path, e.g. `/d/<uid>/<slug>`.
    pub path: String,
}

impl DirectoryEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path: path.into(),
        }
    }

    /// Whether this entry is the dashboard with `uid`, either by id or by a
    /// `/d/<uid>` segment in its path.
    pub fn matches_uid(&self, uid: &str) -> bool {
        if uid.is_empty() {
            return false;
        }
        if self.id == uid {
            return true;
        }
        let marker = format!("/d/{uid}");
        self.path.match_indices(&marker).any(|(at, _)| {
            matches!(
                self.path[at + marker.len()..].chars().next(),
                None | Some('/') | Some('?')
            )
        })
    }
}

/// Search filter. An empty `ids` list means unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub ids: Vec<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn unfiltered() -> Self {
        Self::default()
    }

    pub fn by_ids(ids: Vec<String>) -> Self {
        Self { ids, limit: None }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_filtered(&self) -> bool {
        !self.ids.is_empty()
    }
}

/// Organization id; the wire value may be a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrgId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for OrgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    pub id: OrgId,
    #[serde(default)]
    pub name: String,
}

/// Find the entry for `uid` in a search result.
pub fn find_by_uid<'a>(entries: &'a [DirectoryEntry], uid: &str) -> Option<&'a DirectoryEntry> {
    entries.iter().find(|entry| entry.matches_uid(uid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_id_or_exact_path_segment() {
        let entry = DirectoryEntry::new("abc", "Overview", "/d/abc/overview");
        assert!(entry.matches_uid("abc"));
        assert!(!entry.matches_uid("ab"));
        assert!(!entry.matches_uid(""));

        let legacy = DirectoryEntry::new("17", "Legacy", "/grafana/d/xyz");
        assert!(legacy.matches_uid("xyz"));
        assert!(!legacy.matches_uid("xy"));
    }

    #[test]
    fn org_id_accepts_string_or_number() {
        let n: Org = serde_json::from_str(r#"{"id": 3, "name": "Main"}"#).unwrap_or(Org {
            id: OrgId::Text(String::new()),
            name: String::new(),
        });
        assert_eq!(n.id.to_string(), "3");

        let s: Org = serde_json::from_str(r#"{"id": "ops"}"#).unwrap_or(Org {
            id: OrgId::Number(0),
            name: String::new(),
        });
        assert_eq!(s.id, OrgId::Text("ops".into()));
    }

    #[test]
    fn search_query_builders() {
        assert!(!SearchQuery::unfiltered().is_filtered());
        let q = SearchQuery::by_ids(vec!["a".into()]).with_limit(5);
        assert!(q.is_filtered());
        assert_eq!(q.limit, Some(5));
    }
}
