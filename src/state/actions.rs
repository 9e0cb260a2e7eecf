use serde_json::json;

use crate::models::{Action, Notification, PluginRoute, ScheduledMaintenanceState, Severity};
use crate::providers::AuthProviderConfig;

pub const LOADING_AUTH: &str = "scigateway:loading_auth";
pub const LOADED_AUTH: &str = "scigateway:loaded_auth";
pub const AUTH_SUCCESS: &str = "scigateway:auth_success";
pub const AUTH_FAILURE: &str = "scigateway:auth_failure";
pub const TOKEN_EXPIRED: &str = "scigateway:token_expired";
pub const SIGN_OUT: &str = "scigateway:signout";
pub const LOAD_AUTH_PROVIDER: &str = "scigateway:load_auth_provider";
pub const SITE_LOADING: &str = "scigateway:site_loading";
pub const CONFIGURE_ANALYTICS: &str = "scigateway:configure_analytics";
pub const LOAD_SCHEDULED_MAINTENANCE_STATE: &str = "scigateway:load_scheduled_maintenance_state";

// Part of the plugin-facing API.
pub const NOTIFICATION: &str = "scigateway:api:notification";
pub const DISMISS_NOTIFICATION: &str = "scigateway:api:dismiss_notification";
pub const REGISTER_ROUTE: &str = "scigateway:api:register_route";
pub const REQUEST_PLUGIN_RERENDER: &str = "scigateway:api:plugin_rerender";

pub fn loading_authentication() -> Action {
    Action::new(LOADING_AUTH)
}

pub fn loaded_authentication() -> Action {
    Action::new(LOADED_AUTH)
}

pub fn authorised() -> Action {
    Action::new(AUTH_SUCCESS)
}

pub fn unauthorised() -> Action {
    Action::new(AUTH_FAILURE)
}

pub fn invalid_token() -> Action {
    Action::new(TOKEN_EXPIRED)
}

pub fn sign_out() -> Action {
    Action::new(SIGN_OUT)
}

pub fn load_auth_provider(config: &AuthProviderConfig) -> Action {
    Action::with_payload(LOAD_AUTH_PROVIDER, json!(config))
}

pub fn site_loading_update(loading: bool) -> Action {
    Action::with_payload(SITE_LOADING, json!({ "loading": loading }))
}

pub fn configure_analytics(id: &str) -> Action {
    Action::with_payload(CONFIGURE_ANALYTICS, json!({ "id": id }))
}

pub fn load_scheduled_maintenance_state(state: &ScheduledMaintenanceState) -> Action {
    Action::with_payload(
        LOAD_SCHEDULED_MAINTENANCE_STATE,
        json!({ "scheduledMaintenance": state }),
    )
}

pub fn notification(message: &str, severity: Severity) -> Action {
    Action::with_payload(
        NOTIFICATION,
        json!(Notification {
            message: message.to_string(),
            severity,
        }),
    )
}

pub fn dismiss_notification(index: usize) -> Action {
    Action::with_payload(DISMISS_NOTIFICATION, json!({ "index": index }))
}

pub fn register_route(route: &PluginRoute) -> Action {
    Action::with_payload(REGISTER_ROUTE, json!(route))
}

/// Asks every loaded plugin to redraw itself.
pub fn request_plugin_rerender() -> Action {
    Action::with_payload(REQUEST_PLUGIN_RERENDER, json!({ "broadcast": true }))
}
