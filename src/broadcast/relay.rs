use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use super::bus::{PluginBus, PluginEvent};
use crate::models::Action;
use crate::state::GatewayStore;

/// A plugin message that is not an action: missing, non-object, or
/// without a string `type`.
#[derive(Error, Debug, PartialEq)]
#[error("Invalid message received from a plugin:\nevent.detail = {detail}")]
pub struct InvalidPluginMessage {
    /// The offending `detail`, rendered as JSON.
    pub detail: String,
}

/// Turns a plugin event into the action it carries.
pub fn parse_plugin_event(event: &PluginEvent) -> Result<Action, InvalidPluginMessage> {
    let invalid = || InvalidPluginMessage {
        detail: event.detail.to_string(),
    };

    let has_type = event
        .detail
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    if !has_type {
        return Err(invalid());
    }
    serde_json::from_value(event.detail.clone()).map_err(|_| invalid())
}

/// Dispatches a valid plugin message into the store; logs anything else.
pub fn relay_plugin_event(store: &GatewayStore, event: &PluginEvent) {
    match parse_plugin_event(event) {
        Ok(action) => {
            let action_type = action.action_type.clone();
            if let Err(e) = store.dispatch(action) {
                error!("Plugin action {} was rejected: {}", action_type, e);
            }
        }
        Err(e) => error!("{}", e),
    }
}

/// Background task relaying plugin messages into the store. Dropping the
/// listener stops it.
pub struct PluginListener {
    handle: JoinHandle<()>,
}

impl PluginListener {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PluginListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Starts relaying. Messages emitted after this returns are not missed.
pub fn listen_to_plugins(store: Arc<GatewayStore>, bus: &PluginBus) -> PluginListener {
    let mut receiver = bus.listen();
    let handle = tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => relay_plugin_event(&store, &event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Plugin listener lagged, messages skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    PluginListener { handle }
}
