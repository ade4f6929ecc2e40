//! Canonical query-parameter codec.
//!
//! `QueryParams` is an ordered map, so its string form is deterministic:
//! keys ascending, `key=value` pairs form-urlencoded and joined with `&`,
//! no leading `?`. Repeated keys collapse to the last value on decode.

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Structured query string of a location.
pub type QueryParams = BTreeMap<String, String>;

pub const BREADCRUMB_PARAM: &str = "breadcrumb";
pub const DASHBOARD_PARAM: &str = "dashboard";
pub const ORG_ID_PARAM: &str = "orgId";
pub const RANDOM_PARAM: &str = "random";
pub const UID_PARAM: &str = "uid";
pub const RELAY_TARGET_PARAM: &str = "relaytarget";
pub const RELAY_PARAMS_PARAM: &str = "relayparams";

/// Parameters used internally; they never cross the frame boundary as
/// passthrough parameters.
pub const CONTROL_PARAMS: &[&str] = &[
    BREADCRUMB_PARAM,
    DASHBOARD_PARAM,
    ORG_ID_PARAM,
    RANDOM_PARAM,
    UID_PARAM,
    RELAY_TARGET_PARAM,
    RELAY_PARAMS_PARAM,
];

pub fn is_control_param(key: &str) -> bool {
    CONTROL_PARAMS.contains(&key)
}

/// Render params in canonical form.
pub fn encode_params(params: &QueryParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Parse a query string, with or without its leading `?`.
pub fn decode_params(query: &str) -> QueryParams {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = QueryParams::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        params.insert(key.into_owned(), value.into_owned());
    }
    params
}

/// Drop every control parameter.
pub fn strip_control(params: &QueryParams) -> QueryParams {
    params
        .iter()
        .filter(|(key, _)| !is_control_param(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Params for a navigation link: control parameters stripped, `orgId` kept
/// so the destination stays in the same organization.
pub fn navigation_params(params: &QueryParams) -> QueryParams {
    params
        .iter()
        .filter(|(key, _)| key.as_str() == ORG_ID_PARAM || !is_control_param(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Domain parameters in the `&key=value&key=value` form the embedding frame
/// expects. Empty and literal `null` values are left out.
pub fn passthrough_string(params: &QueryParams) -> String {
    let mut out = String::new();
    for (key, value) in params {
        if is_control_param(key) || value.is_empty() || value == "null" {
            continue;
        }
        out.push('&');
        out.push_str(
            &form_urlencoded::Serializer::new(String::new())
                .append_pair(key, value)
                .finish(),
        );
    }
    out
}
