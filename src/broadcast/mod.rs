//! The plugin boundary: actions flagged `broadcast` go out to every
//! plugin, and plugin messages come back in as actions.

pub mod bus;
pub mod middleware;
pub mod relay;

pub use bus::{PluginBus, PluginEvent, PluginSubscription, DEFAULT_CAPACITY};
pub use middleware::BroadcastMiddleware;
pub use relay::{listen_to_plugins, parse_plugin_event, relay_plugin_event, InvalidPluginMessage, PluginListener};
