//! Trail data model.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::params::{encode_params, navigation_params, QueryParams};

/// One visited dashboard in the trail.
///
/// Serialized with camelCase keys; this is the shape stored under the
/// `dashlist` key and sent to the embedding frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbItem {
    /// Opaque dashboard identifier (the dashboard uid). Also the leaf token.
    pub id: String,
    /// Canonical location, e.g. `/d/<uid>/<slug>`.
    pub path: String,
    pub display_name: String,
    #[serde(default)]
    pub query_params: QueryParams,
    #[serde(default)]
    pub resolved_url: String,
}

impl BreadcrumbItem {
    /// Build an item and compute its absolute link against `origin`.
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        display_name: impl Into<String>,
        query_params: QueryParams,
        origin: &str,
    ) -> Self {
        let path = path.into();
        let resolved_url = resolve_link(origin, &path, &query_params);
        Self {
            id: id.into(),
            path,
            display_name: display_name.into(),
            query_params,
            resolved_url,
        }
    }

    /// Link used when the user jumps back to this item: control parameters
    /// stripped except `orgId`.
    pub fn destination(&self, origin: &str) -> String {
        resolve_link(origin, &self.path, &navigation_params(&self.query_params))
    }
}

/// Join `path` and `params` onto `origin`.
///
/// Falls back to a relative link when `origin` is not an absolute URL.
pub fn resolve_link(origin: &str, path: &str, params: &QueryParams) -> String {
    let query = encode_params(params);
    match Url::parse(origin).and_then(|base| base.join(path)) {
        Ok(mut url) => {
            url.set_query(if query.is_empty() { None } else { Some(&query) });
            url.to_string()
        }
        Err(_) if query.is_empty() => path.to_string(),
        Err(_) => format!("{path}?{query}"),
    }
}

/// Extract the dashboard uid from a `/d/<uid>/<slug>` style path.
///
/// Mount prefixes (`/grafana/d/...`) are tolerated; the segment following
/// the last `d` segment is returned.
pub fn dashboard_uid_from_path(path: &str) -> Option<&str> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let marker = segments.iter().rposition(|s| *s == "d")?;
    segments.get(marker + 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn new_resolves_absolute_link() {
        let item = BreadcrumbItem::new(
            "abc",
            "/d/abc/overview",
            "Overview",
            params(&[("orgId", "1")]),
            "https://grafana.example",
        );
        assert_eq!(
            item.resolved_url,
            "https://grafana.example/d/abc/overview?orgId=1"
        );
    }

    #[test]
    fn resolve_link_without_origin_is_relative() {
        assert_eq!(resolve_link("", "/d/x/y", &QueryParams::new()), "/d/x/y");
        assert_eq!(
            resolve_link("", "/d/x/y", &params(&[("orgId", "2")])),
            "/d/x/y?orgId=2"
        );
    }

    #[test]
    fn destination_strips_control_params() {
        let item = BreadcrumbItem::new(
            "abc",
            "/d/abc/overview",
            "Overview",
            params(&[("orgId", "1"), ("breadcrumb", "abc,def"), ("from", "now-1h")]),
            "https://grafana.example",
        );
        assert_eq!(
            item.destination("https://grafana.example"),
            "https://grafana.example/d/abc/overview?from=now-1h&orgId=1"
        );
    }

    #[test]
    fn storage_shape_is_camel_case() {
        let item = BreadcrumbItem::new("a", "/d/a/x", "X", QueryParams::new(), "");
        let json = serde_json::to_value(&item).unwrap_or_default();
        assert_eq!(json["displayName"], "X");
        assert!(json.get("resolvedUrl").is_some());
        assert!(json.get("queryParams").is_some());
    }

    #[test]
    fn uid_is_taken_from_dashboard_path() {
        assert_eq!(dashboard_uid_from_path("/d/abc/overview"), Some("abc"));
        assert_eq!(dashboard_uid_from_path("/grafana/d/xyz/slug"), Some("xyz"));
        assert_eq!(dashboard_uid_from_path("/d/abc"), Some("abc"));
        assert_eq!(dashboard_uid_from_path("/dashboards"), None);
        assert_eq!(dashboard_uid_from_path("/d/"), None);
    }
}
