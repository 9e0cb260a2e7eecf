use super::bus::PluginBus;
use crate::models::Action;
use crate::state::Middleware;

/// Forwards actions flagged `broadcast` to every plugin. The action still
/// reaches the reducer afterwards.
pub struct BroadcastMiddleware {
    bus: PluginBus,
}

impl BroadcastMiddleware {
    pub fn new(bus: PluginBus) -> Self {
        Self { bus }
    }
}

impl Middleware for BroadcastMiddleware {
    fn handle(&self, action: &Action) {
        if action.is_broadcast() {
            self.bus.publish(action.clone());
        }
    }
}
