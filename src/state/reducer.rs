//! The reducer: folds one action at a time into [`GatewayState`].
//!
//! Reducing never performs network I/O. The only provider calls made here
//! are `log_out`, which clears the token store, and building a provider
//! for `load_auth_provider`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::actions::*;
use crate::error::StateError;
use crate::models::{Action, Notification, PluginRoute, ScheduledMaintenanceState};
use crate::providers::{
    create_auth_provider, AuthProvider, AuthProviderConfig, LoadingAuthProvider, ProviderContext,
};

/// Where the auth state machine currently is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// No request in flight and no outcome yet (or signed out).
    Idle,
    Loading,
    Authorised,
    /// The last login attempt failed.
    Unauthorised,
    /// The stored token was rejected and could not be refreshed.
    Expired,
}

#[derive(Clone)]
pub struct AuthState {
    pub status: AuthStatus,
    pub provider: Arc<dyn AuthProvider>,
}

impl AuthState {
    pub fn loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }

    pub fn failed_to_login(&self) -> bool {
        self.status == AuthStatus::Unauthorised
    }

    pub fn signed_out_due_to_token_expiry(&self) -> bool {
        self.status == AuthStatus::Expired
    }

    /// Logs the current provider out and moves to `status`.
    fn reset(&mut self, status: AuthStatus) {
        self.provider.log_out();
        self.status = status;
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("status", &self.status)
            .field("provider", &self.provider.get_name())
            .finish()
    }
}

/// Everything the shell knows about the running site.
#[derive(Clone, Debug)]
pub struct GatewayState {
    pub authorisation: AuthState,
    pub notifications: Vec<Notification>,
    pub plugins: Vec<PluginRoute>,
    pub site_loading: bool,
    pub analytics_id: Option<String>,
    pub scheduled_maintenance: ScheduledMaintenanceState,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self {
            authorisation: AuthState {
                status: AuthStatus::Idle,
                provider: Arc::new(LoadingAuthProvider),
            },
            notifications: Vec::new(),
            plugins: Vec::new(),
            site_loading: true,
            analytics_id: None,
            scheduled_maintenance: ScheduledMaintenanceState::default(),
        }
    }
}

#[derive(Deserialize)]
struct SiteLoadingPayload {
    loading: bool,
}

#[derive(Deserialize)]
struct AnalyticsPayload {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaintenancePayload {
    scheduled_maintenance: ScheduledMaintenanceState,
}

#[derive(Deserialize)]
struct DismissPayload {
    index: usize,
}

fn payload<T: DeserializeOwned>(action: &Action) -> Result<T, StateError> {
    let value = action
        .payload
        .clone()
        .ok_or_else(|| StateError::MissingPayload(action.action_type.clone()))?;
    serde_json::from_value(value).map_err(|source| StateError::Payload {
        action: action.action_type.clone(),
        source,
    })
}

impl GatewayState {
    /// Applies `action`. Unknown action types leave the state untouched.
    ///
    /// On error the state is unchanged.
    pub fn reduce(&mut self, action: &Action, context: &ProviderContext) -> Result<(), StateError> {
        let auth = &mut self.authorisation;
        match action.action_type.as_str() {
            LOADING_AUTH => auth.status = AuthStatus::Loading,
            LOADED_AUTH => {
                if auth.status == AuthStatus::Loading {
                    auth.status = AuthStatus::Idle;
                }
            }
            AUTH_SUCCESS => auth.status = AuthStatus::Authorised,
            AUTH_FAILURE => auth.reset(AuthStatus::Unauthorised),
            TOKEN_EXPIRED => auth.reset(AuthStatus::Expired),
            SIGN_OUT => auth.reset(AuthStatus::Idle),
            LOAD_AUTH_PROVIDER => {
                let config: AuthProviderConfig = payload(action)?;
                let provider = create_auth_provider(&config, context)?;
                info!("Switching auth provider to '{}'", provider.get_name());
                auth.provider.retire();
                auth.provider = provider;
                auth.status = AuthStatus::Idle;
            }
            SITE_LOADING => {
                let SiteLoadingPayload { loading } = payload(action)?;
                self.site_loading = loading;
            }
            CONFIGURE_ANALYTICS => {
                let AnalyticsPayload { id } = payload(action)?;
                self.analytics_id = Some(id);
            }
            LOAD_SCHEDULED_MAINTENANCE_STATE => {
                let MaintenancePayload {
                    scheduled_maintenance,
                } = payload(action)?;
                self.scheduled_maintenance = scheduled_maintenance;
            }
            NOTIFICATION => {
                let notification: Notification = payload(action)?;
                self.notifications.push(notification);
            }
            DISMISS_NOTIFICATION => {
                let DismissPayload { index } = payload(action)?;
                if index < self.notifications.len() {
                    self.notifications.remove(index);
                } else {
                    debug!("No notification at index {} to dismiss", index);
                }
            }
            REGISTER_ROUTE => {
                let route: PluginRoute = payload(action)?;
                if self.plugins.iter().any(|p| p.link == route.link) {
                    error!(
                        "Duplicate plugin route identified: {}. {} not registered",
                        route.link, route.plugin
                    );
                } else {
                    self.plugins.push(route);
                }
            }
            other => debug!(
                action_type = other,
                has_payload = action.payload.as_ref().is_some_and(|p| !p.is_null()),
                "No reducer for action, passing through"
            ),
        }
        Ok(())
    }
}

/// A JSON view of the state for display.
pub fn summary(state: &GatewayState) -> Value {
    serde_json::json!({
        "status": state.authorisation.status,
        "provider": state.authorisation.provider.get_name(),
        "loggedIn": state.authorisation.provider.is_logged_in(),
        "user": state.authorisation.provider.user(),
        "loginUrl": state.authorisation.provider.login_url(),
        "siteLoading": state.site_loading,
        "notifications": state.notifications,
        "plugins": state.plugins,
        "scheduledMaintenance": state.scheduled_maintenance,
    })
}
