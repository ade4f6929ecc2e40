//! Notifications to the embedding parent window.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use dashtrail_core::model::BreadcrumbItem;
use dashtrail_core::params::{
    decode_params, passthrough_string, QueryParams, RELAY_PARAMS_PARAM, RELAY_TARGET_PARAM,
};

use crate::ports::MessagingPort;

/// Messages go to whatever origin embeds the viewer.
pub const TARGET_ORIGIN: &str = "*";

/// Wire shape of a trail notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMessage {
    /// Id of the dashboard now shown.
    pub dashboard: String,
    pub breadcrumb: Vec<BreadcrumbItem>,
    pub org_id: String,
    pub passthrough_params: String,
}

impl FrameMessage {
    pub fn new(
        dashboard: impl Into<String>,
        trail: &[BreadcrumbItem],
        org_id: impl Into<String>,
        params: &QueryParams,
    ) -> Self {
        Self {
            dashboard: dashboard.into(),
            breadcrumb: trail.to_vec(),
            org_id: org_id.into(),
            passthrough_params: passthrough_string(params),
        }
    }
}

/// Build the relay-target message for `query`, if it asks for one.
///
/// `relayparams` may carry its own query after a `?`; those pairs become
/// top-level keys and `relayparams` keeps only the part before the `?`.
pub fn relay_message(query: &QueryParams) -> Option<Map<String, Value>> {
    let target = query.get(RELAY_TARGET_PARAM)?;
    if target.is_empty() {
        return None;
    }
    let mut message = Map::new();
    message.insert(RELAY_TARGET_PARAM.to_string(), Value::from(target.as_str()));

    let relay_params = match query.get(RELAY_PARAMS_PARAM) {
        Some(raw) => raw,
        None => {
            message.insert(RELAY_PARAMS_PARAM.to_string(), Value::Null);
            return Some(message);
        }
    };
    match relay_params.split_once('?') {
        Some((path, inner)) => {
            message.insert(RELAY_PARAMS_PARAM.to_string(), Value::from(path));
            for (key, value) in decode_params(inner) {
                if key == RELAY_TARGET_PARAM || key == RELAY_PARAMS_PARAM {
                    continue;
                }
                message.insert(key, Value::from(value));
            }
        }
        None => {
            message.insert(
                RELAY_PARAMS_PARAM.to_string(),
                Value::from(relay_params.as_str()),
            );
        }
    }
    Some(message)
}

pub struct FrameRelay {
    messaging: Arc<dyn MessagingPort>,
}

impl FrameRelay {
    pub fn new(messaging: Arc<dyn MessagingPort>) -> Self {
        Self { messaging }
    }

    /// Post a trail notification. Returns whether a message went out.
    pub fn notify(&self, message: &FrameMessage) -> bool {
        match serde_json::to_value(message) {
            Ok(value) => {
                debug!(dashboard = %message.dashboard, org_id = %message.org_id, "notifying parent frame");
                self.messaging.post_to_top(value, TARGET_ORIGIN);
                true
            }
            Err(err) => {
                warn!(error = %err, "could not encode frame message");
                false
            }
        }
    }

    /// Forward a `relaytarget` request to the parent. Returns the message
    /// posted, if any.
    pub fn relay_target(&self, query: &QueryParams) -> Option<Value> {
        let message = Value::Object(relay_message(query)?);
        debug!(message = %message, "relaying target to parent frame");
        self.messaging.post_to_top(message.clone(), TARGET_ORIGIN);
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMessaging;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn frame_message_wire_shape() {
        let item = BreadcrumbItem::new("a", "/d/a/x", "A", QueryParams::new(), "");
        let message = FrameMessage::new(
            "a",
            &[item],
            "1",
            &params(&[("orgId", "1"), ("from", "now-1h"), ("breadcrumb", "a"), ("x", "null")]),
        );
        let value = serde_json::to_value(&message).unwrap_or_default();
        assert_eq!(value["dashboard"], "a");
        assert_eq!(value["orgId"], "1");
        assert_eq!(value["passthroughParams"], "&from=now-1h");
        assert_eq!(value["breadcrumb"][0]["displayName"], "A");
    }

    #[test]
    fn notify_posts_to_any_origin() {
        let messaging = Arc::new(MemoryMessaging::new());
        let relay = FrameRelay::new(messaging.clone());
        assert!(relay.notify(&FrameMessage::new("a", &[], "", &QueryParams::new())));
        assert_eq!(messaging.count(), 1);
        assert_eq!(messaging.target_origins(), vec!["*".to_string()]);
    }

    #[test]
    fn relay_message_splits_inner_query() {
        let query = params(&[
            ("relaytarget", "logs"),
            ("relayparams", "search?option=test&level=warn"),
        ]);
        let message = Value::Object(relay_message(&query).unwrap_or_default());
        assert_eq!(
            message,
            json!({
                "relaytarget": "logs",
                "relayparams": "search",
                "option": "test",
                "level": "warn",
            })
        );
    }

    #[test]
    fn relay_message_keeps_plain_params() {
        let query = params(&[("relaytarget", "logs"), ("relayparams", "search")]);
        let message = Value::Object(relay_message(&query).unwrap_or_default());
        assert_eq!(message, json!({"relaytarget": "logs", "relayparams": "search"}));
    }

    #[test]
    fn relay_message_inner_query_cannot_replace_relay_keys() {
        let query = params(&[
            ("relaytarget", "logs"),
            ("relayparams", "search?relaytarget=other"),
        ]);
        let message = relay_message(&query).unwrap_or_default();
        assert_eq!(message["relaytarget"], "logs");
    }

    #[test]
    fn no_relay_target_means_no_message() {
        let messaging = Arc::new(MemoryMessaging::new());
        let relay = FrameRelay::new(messaging.clone());
        assert!(relay.relay_target(&params(&[("orgId", "1")])).is_none());
        assert!(relay.relay_target(&params(&[("relaytarget", "")])).is_none());
        assert_eq!(messaging.count(), 0);
        assert!(relay.relay_target(&params(&[("relaytarget", "logs")])).is_some());
        assert_eq!(messaging.messages()[0]["relayparams"], Value::Null);
    }
}
