use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message on the gateway's internal bus: `{ "type": ..., "payload": ... }`.
///
/// Only messages whose payload carries `"broadcast": true` cross the
/// plugin boundary. Any other top-level fields a plugin sends are kept in
/// `extra` and written back out unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Action {
    pub fn new(action_type: impl Into<String>) -> Self {
        Action {
            action_type: action_type.into(),
            payload: None,
            extra: Map::new(),
        }
    }

    pub fn with_payload(action_type: impl Into<String>, payload: Value) -> Self {
        Action {
            action_type: action_type.into(),
            payload: Some(payload),
            extra: Map::new(),
        }
    }

    /// True only for an explicit boolean `true` under `payload.broadcast`.
    pub fn is_broadcast(&self) -> bool {
        self.payload
            .as_ref()
            .and_then(|payload| payload.get("broadcast"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
