//! Site startup: wiring the gateway together and bringing the configured
//! auth provider up.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analytics::Analytics;
use crate::broadcast::{listen_to_plugins, BroadcastMiddleware, PluginBus, PluginListener};
use crate::config::ConfigV1;
use crate::error::{StateError, StorageError};
use crate::models::Severity;
use crate::providers::ProviderContext;
use crate::state::intents::settle;
use crate::state::{actions, AuthStatus, GatewayStore};
use crate::store::{create_storage, TokenStore};

/// The running gateway: the store plus the shared resources around it.
pub struct Gateway {
    pub store: Arc<GatewayStore>,
    pub bus: PluginBus,
    pub analytics: Analytics,
}

impl Gateway {
    /// Starts relaying plugin messages into the store.
    pub fn listen(&self) -> PluginListener {
        listen_to_plugins(self.store.clone(), &self.bus)
    }
}

/// Builds storage, analytics, the plugin bus and the store for `config`.
/// The store starts with the loading provider installed.
pub fn build_gateway(config: &ConfigV1) -> Result<Gateway, StorageError> {
    let storage = create_storage(&config.storage)?;
    let analytics = Analytics::new();
    let bus = PluginBus::default();
    let context = ProviderContext::new(TokenStore::new(storage), analytics.clone());
    let store = GatewayStore::new(context).with_middleware(Arc::new(BroadcastMiddleware::new(bus.clone())));

    Ok(Gateway {
        store: Arc::new(store),
        bus,
        analytics,
    })
}

/// Installs the configured provider and settles the initial auth state:
/// a stored token is verified (falling back to auto-login), otherwise an
/// auto-login capable provider opens a session. An unknown provider is
/// returned as an error.
pub async fn configure_site(store: &GatewayStore, config: &ConfigV1) -> Result<AuthStatus, StateError> {
    if let Some(id) = &config.ga_tracking_id {
        store.dispatch(actions::configure_analytics(id))?;
    }

    store.dispatch(actions::load_auth_provider(&config.auth_provider_config()))?;
    let provider = store.provider()?;
    info!("Configuring site with auth provider '{}'", provider.get_name());

    if provider.is_logged_in() {
        let outcome = match provider.verify_log_in().await {
            Ok(()) => actions::authorised(),
            Err(e) => {
                debug!("Stored token rejected at startup: {}", e);
                match provider.as_auto_login() {
                    Some(auto) => {
                        store.dispatch(actions::loading_authentication())?;
                        match auto.auto_login().await {
                            Ok(()) => actions::authorised(),
                            Err(_) => actions::invalid_token(),
                        }
                    }
                    None => actions::invalid_token(),
                }
            }
        };
        settle(store, &provider, outcome)?;
    } else if let Some(auto) = provider.as_auto_login() {
        store.dispatch(actions::loading_authentication())?;
        let outcome = match auto.auto_login().await {
            Ok(()) => actions::authorised(),
            Err(e) => {
                warn!("Auto-login failed: {}", e);
                actions::loaded_authentication()
            }
        };
        settle(store, &provider, outcome)?;
    }

    store.dispatch(actions::site_loading_update(false))?;

    if let Some(maintenance) = provider.as_scheduled_maintenance() {
        match maintenance.fetch_scheduled_maintenance_state().await {
            Ok(state) => {
                store.dispatch(actions::load_scheduled_maintenance_state(&state))?;
                if state.show {
                    store.dispatch(actions::notification(&state.message, Severity::Warning))?;
                }
            }
            Err(e) => warn!("Could not fetch scheduled maintenance state: {}", e),
        }
    }

    Ok(store.state()?.authorisation.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, StoreConfig};
    use crate::error::ConfigError;

    fn settings(auth_provider: &str) -> ConfigV1 {
        ConfigV1 {
            auth_provider: auth_provider.to_string(),
            auth_url: None,
            github_client_id: None,
            anonymous_login: false,
            ga_tracking_id: Some("UA-1".to_string()),
            storage: StoreConfig::Memory,
            logging: LoggingConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_stored_token_is_verified_at_startup() {
        let config = settings("test");
        let gateway = build_gateway(&config).unwrap();
        gateway.store.context().tokens.set("user:password").unwrap();

        let status = configure_site(&gateway.store, &config).await.unwrap();
        assert_eq!(status, AuthStatus::Authorised);

        let state = gateway.store.state().unwrap();
        assert!(!state.site_loading);
        assert_eq!(state.analytics_id.as_deref(), Some("UA-1"));
        assert_eq!(state.authorisation.provider.get_type(), "test");
    }

    #[tokio::test]
    async fn test_no_token_stays_idle() {
        let config = settings("test");
        let gateway = build_gateway(&config).unwrap();

        let status = configure_site(&gateway.store, &config).await.unwrap();
        assert_eq!(status, AuthStatus::Idle);
        assert!(!gateway.store.state().unwrap().site_loading);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_fatal() {
        let config = settings("kerberos");
        let gateway = build_gateway(&config).unwrap();

        let err = configure_site(&gateway.store, &config).await.unwrap_err();
        assert!(matches!(
            err,
            StateError::Config(ConfigError::UnrecognisedProvider(_))
        ));
    }
}
