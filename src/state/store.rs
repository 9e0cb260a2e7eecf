use std::sync::{Arc, RwLock};

use tracing::debug;

use super::reducer::GatewayState;
use crate::error::StateError;
use crate::models::Action;
use crate::providers::{AuthProvider, ProviderContext};

/// Sees every dispatched action before it is reduced.
pub trait Middleware: Send + Sync {
    fn handle(&self, action: &Action);
}

/// Holds the single [`GatewayState`] and serialises dispatches into it.
pub struct GatewayStore {
    state: RwLock<GatewayState>,
    context: ProviderContext,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl GatewayStore {
    pub fn new(context: ProviderContext) -> Self {
        Self {
            state: RwLock::new(GatewayState::default()),
            context,
            middleware: Vec::new(),
        }
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Installs `provider` without going through `load_auth_provider`.
    pub fn with_provider(self, provider: Arc<dyn AuthProvider>) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.authorisation.provider = provider;
        }
        self
    }

    /// Runs the middleware chain, then reduces `action`.
    pub fn dispatch(&self, action: Action) -> Result<(), StateError> {
        debug!("Dispatching {}", action.action_type);
        for middleware in &self.middleware {
            middleware.handle(&action);
        }
        let mut state = self.state.write().map_err(|_| StateError::Poisoned)?;
        state.reduce(&action, &self.context)
    }

    /// Dispatches `action` only while `provider` is still installed. The
    /// check and the reduce happen under one write lock, so a concurrent
    /// `load_auth_provider` lands either before both or after both.
    pub fn dispatch_if_current(
        &self,
        provider: &Arc<dyn AuthProvider>,
        action: Action,
    ) -> Result<bool, StateError> {
        let mut state = self.state.write().map_err(|_| StateError::Poisoned)?;
        if !same_provider(&state.authorisation.provider, provider) {
            return Ok(false);
        }
        debug!("Dispatching {}", action.action_type);
        for middleware in &self.middleware {
            middleware.handle(&action);
        }
        state.reduce(&action, &self.context)?;
        Ok(true)
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> Result<GatewayState, StateError> {
        self.state
            .read()
            .map(|state| state.clone())
            .map_err(|_| StateError::Poisoned)
    }

    pub fn provider(&self) -> Result<Arc<dyn AuthProvider>, StateError> {
        self.state
            .read()
            .map(|state| state.authorisation.provider.clone())
            .map_err(|_| StateError::Poisoned)
    }

    /// True while `provider` is still the installed provider.
    pub fn is_current_provider(&self, provider: &Arc<dyn AuthProvider>) -> bool {
        self.provider()
            .map(|current| same_provider(&current, provider))
            .unwrap_or(false)
    }

    pub fn context(&self) -> &ProviderContext {
        &self.context
    }
}

fn same_provider(a: &Arc<dyn AuthProvider>, b: &Arc<dyn AuthProvider>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Analytics;
    use crate::providers::AuthProviderConfig;
    use crate::state::AuthStatus;
    use crate::state::actions;
    use crate::store::TokenStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Middleware for Recorder {
        fn handle(&self, action: &Action) {
            self.seen.lock().unwrap().push(action.action_type.clone());
        }
    }

    fn store() -> GatewayStore {
        GatewayStore::new(ProviderContext::new(TokenStore::in_memory(), Analytics::new()))
    }

    #[test]
    fn test_middleware_sees_every_action() {
        let recorder = Arc::new(Recorder::default());
        let store = store().with_middleware(recorder.clone());

        store.dispatch(actions::loading_authentication()).unwrap();
        store.dispatch(Action::new("plugin:custom")).unwrap();

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![actions::LOADING_AUTH.to_string(), "plugin:custom".to_string()]
        );
    }

    #[test]
    fn test_provider_identity_changes_on_switch() {
        let store = store();
        let before = store.provider().unwrap();
        assert!(store.is_current_provider(&before));

        store
            .dispatch(actions::load_auth_provider(&AuthProviderConfig {
                auth_provider: "test".to_string(),
                ..Default::default()
            }))
            .unwrap();

        assert!(!store.is_current_provider(&before));
        assert!(store.is_current_provider(&store.provider().unwrap()));
    }

    #[test]
    fn test_dispatch_if_current_skips_replaced_provider() {
        let recorder = Arc::new(Recorder::default());
        let store = store().with_middleware(recorder.clone());
        let before = store.provider().unwrap();
        store
            .dispatch(actions::load_auth_provider(&AuthProviderConfig {
                auth_provider: "test".to_string(),
                ..Default::default()
            }))
            .unwrap();

        assert!(!store.dispatch_if_current(&before, actions::authorised()).unwrap());
        assert_eq!(store.state().unwrap().authorisation.status, AuthStatus::Idle);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);

        let current = store.provider().unwrap();
        assert!(store.dispatch_if_current(&current, actions::authorised()).unwrap());
        assert_eq!(recorder.seen.lock().unwrap().len(), 2);
    }
}
