//! Async operations that call the installed provider and dispatch the
//! outcome.
//!
//! Each intent captures the provider at start. If a `load_auth_provider`
//! lands while the call is in flight, the replaced provider is retired and
//! can no longer touch the shared token store. Its late result is dropped
//! rather than applied to the new provider.

use std::sync::Arc;

use tracing::{debug, warn};

use super::actions;
use super::reducer::AuthStatus;
use super::store::GatewayStore;
use crate::error::StateError;
use crate::models::Action;
use crate::providers::AuthProvider;

fn status(store: &GatewayStore) -> Result<AuthStatus, StateError> {
    Ok(store.state()?.authorisation.status)
}

/// Dispatches `action` only if `provider` is still installed.
pub(crate) fn settle(
    store: &GatewayStore,
    provider: &Arc<dyn AuthProvider>,
    action: Action,
) -> Result<AuthStatus, StateError> {
    let action_type = action.action_type.clone();
    if !store.dispatch_if_current(provider, action)? {
        debug!(
            "Dropping {} from '{}', provider was replaced",
            action_type,
            provider.get_name()
        );
    }
    status(store)
}

/// Exchanges credentials for a token.
pub async fn verify_username_and_password(
    store: &GatewayStore,
    username: &str,
    password: &str,
) -> Result<AuthStatus, StateError> {
    let provider = store.provider()?;
    store.dispatch(actions::loading_authentication())?;

    let outcome = match provider.log_in(username, password).await {
        Ok(()) => actions::authorised(),
        Err(e) => {
            warn!("Login via {} failed: {}", provider.get_name(), e);
            actions::unauthorised()
        }
    };
    settle(store, &provider, outcome)
}

pub fn sign_out(store: &GatewayStore) -> Result<AuthStatus, StateError> {
    store.dispatch(actions::sign_out())?;
    status(store)
}

/// Checks the stored token with the server. Does nothing when no token
/// is stored.
pub async fn verify_session(store: &GatewayStore) -> Result<AuthStatus, StateError> {
    let provider = store.provider()?;
    if !provider.is_logged_in() {
        debug!("No stored token, skipping verification");
        return status(store);
    }

    store.dispatch(actions::loading_authentication())?;
    let outcome = match provider.verify_log_in().await {
        Ok(()) => actions::authorised(),
        Err(e) => {
            warn!("Stored token rejected by {}: {}", provider.get_name(), e);
            actions::invalid_token()
        }
    };
    settle(store, &provider, outcome)
}

/// Exchanges the stored token for a fresh one. Does nothing when no token
/// is stored.
pub async fn refresh_session(store: &GatewayStore) -> Result<AuthStatus, StateError> {
    let provider = store.provider()?;
    let Some(refresher) = provider.as_refresh() else {
        return Err(StateError::Unsupported {
            provider: provider.get_name().to_string(),
            capability: "token refresh",
        });
    };
    if !provider.is_logged_in() {
        debug!("No stored token, skipping refresh");
        return status(store);
    }

    let outcome = match refresher.refresh().await {
        Ok(()) => actions::authorised(),
        Err(e) => {
            warn!("Token refresh via {} failed: {}", provider.get_name(), e);
            actions::invalid_token()
        }
    };
    settle(store, &provider, outcome)
}
