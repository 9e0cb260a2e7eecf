use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{info, trace, warn};

use crate::models::Action;

/// Buffered messages per channel before a slow receiver starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

/// A message a plugin sends to the shell. `detail` is expected to be an
/// action object, but nothing is assumed until it is validated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginEvent {
    #[serde(default)]
    pub detail: Value,
}

impl PluginEvent {
    pub fn new(detail: Value) -> Self {
        Self { detail }
    }
}

/// Two independent channels between the shell and its plugins.
///
/// Outbound carries broadcast actions from the shell. Inbound carries
/// plugin events towards the shell. Keeping them apart stops the shell's
/// own broadcasts from being relayed back into it.
#[derive(Clone)]
pub struct PluginBus {
    outbound: broadcast::Sender<Action>,
    inbound: broadcast::Sender<PluginEvent>,
}

impl PluginBus {
    pub fn new(capacity: usize) -> Self {
        info!(capacity, "Creating plugin bus");
        let (outbound, _) = broadcast::channel(capacity);
        let (inbound, _) = broadcast::channel(capacity);
        Self { outbound, inbound }
    }

    /// Delivers `action` to every current subscriber and returns how many
    /// received it. With no subscribers the action is dropped.
    pub fn publish(&self, action: Action) -> usize {
        let action_type = action.action_type.clone();
        match self.outbound.send(action) {
            Ok(receivers) => {
                trace!(receivers, action_type = %action_type, "Broadcast action to plugins");
                receivers
            }
            Err(_) => {
                trace!(action_type = %action_type, "No plugins subscribed, broadcast dropped");
                0
            }
        }
    }

    /// Plugin side: receive every action broadcast from now on.
    pub fn subscribe(&self) -> PluginSubscription {
        trace!("Plugin subscribed to broadcasts");
        PluginSubscription {
            receiver: self.outbound.subscribe(),
        }
    }

    /// Plugin side: send a message to the shell.
    pub fn emit(&self, event: PluginEvent) -> usize {
        self.inbound.send(event).unwrap_or(0)
    }

    pub(crate) fn listen(&self) -> broadcast::Receiver<PluginEvent> {
        self.inbound.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.outbound.receiver_count()
    }
}

impl Default for PluginBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A plugin's view of the outbound channel. Dropping it unsubscribes.
pub struct PluginSubscription {
    receiver: broadcast::Receiver<Action>,
}

impl PluginSubscription {
    /// Waits for the next broadcast. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Action> {
        loop {
            match self.receiver.recv().await {
                Ok(action) => return Some(action),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Plugin subscription lagged, broadcasts skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The next buffered broadcast, if any.
    pub fn try_recv(&mut self) -> Option<Action> {
        loop {
            match self.receiver.try_recv() {
                Ok(action) => return Some(action),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Plugin subscription lagged, broadcasts skipped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers_drops() {
        let bus = PluginBus::default();
        assert_eq!(bus.publish(Action::new("test")), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_each_action_once() {
        let bus = PluginBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let action = Action::with_payload("test", json!({"broadcast": true}));
        assert_eq!(bus.publish(action.clone()), 2);

        assert_eq!(first.recv().await, Some(action.clone()));
        assert_eq!(second.recv().await, Some(action));
        assert_eq!(first.try_recv(), None);
    }

    #[test]
    fn test_dropped_subscription_unsubscribes() {
        let bus = PluginBus::default();
        let subscription = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_does_not_see_earlier_broadcasts() {
        let bus = PluginBus::default();
        let mut early = bus.subscribe();
        bus.publish(Action::new("before"));
        let mut late = bus.subscribe();

        assert_eq!(early.try_recv(), Some(Action::new("before")));
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn test_emit_goes_to_inbound_only() {
        let bus = PluginBus::default();
        let mut subscription = bus.subscribe();
        let mut inbound = bus.listen();

        bus.emit(PluginEvent::new(json!({"type": "test"})));
        assert_eq!(subscription.try_recv(), None);
        assert_eq!(inbound.try_recv().unwrap().detail, json!({"type": "test"}));
    }
}
