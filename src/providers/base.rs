use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    github_provider::{GithubAuthConfig, GithubAuthProvider},
    icat_provider::{IcatAuthConfig, IcatAuthProvider},
    jwt_provider::{JwtAuthConfig, JwtAuthProvider},
    test_provider::TestAuthProvider,
};
use crate::analytics::{Analytics, AnalyticsRecorder, LOGIN_CATEGORY};
use crate::error::{AuthError, ConfigError};
use crate::models::{ScheduledMaintenanceState, User};
use crate::store::TokenStore;

/// Which auth provider to install, as named in the site settings.
///
/// `auth_provider` is `icat`, `icat.<mnemonic>`, `jwt`, `github` or `test`.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthProviderConfig {
    pub auth_provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_client_id: Option<String>,
    /// Lets the ICAT provider open an anonymous session when nobody is logged in.
    #[serde(default)]
    pub anonymous_login: bool,
}

/// Shared resources every provider instance is built with.
#[derive(Clone)]
pub struct ProviderContext {
    pub tokens: TokenStore,
    pub analytics: Analytics,
    pub client: reqwest::Client,
}

impl ProviderContext {
    pub fn new(tokens: TokenStore, analytics: Analytics) -> Self {
        Self {
            tokens,
            analytics,
            client: reqwest::Client::new(),
        }
    }
}

/// An auth provider exchanges credentials for a token and checks that the
/// stored token is still accepted.
///
/// Optional capabilities are exposed through the accessor methods at the
/// bottom; a provider that lacks one returns `None`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn get_name(&self) -> &str;

    /// The selection name this provider was configured with (`icat`, `jwt`, ...).
    fn get_type(&self) -> &str;

    fn is_logged_in(&self) -> bool;

    fn user(&self) -> Option<User>;

    /// Resolves immediately if already logged in. On failure the token is
    /// cleared and the error returned.
    async fn log_in(&self, username: &str, password: &str) -> Result<(), AuthError>;

    /// Clears the token and user. Makes no network call.
    fn log_out(&self);

    /// Logs out for good: called when this provider is replaced. Afterwards
    /// the provider leaves the token store alone, so late results from calls
    /// still in flight cannot touch its successor's session.
    fn retire(&self) {
        self.log_out();
    }

    /// Asks the server whether the stored token is still valid, falling back
    /// to one refresh when the provider supports it.
    async fn verify_log_in(&self) -> Result<(), AuthError>;

    /// An external page the user must visit to log in, for redirect-based providers.
    fn login_url(&self) -> Option<String> {
        None
    }

    fn as_refresh(&self) -> Option<&dyn Refresh> {
        None
    }

    fn as_auto_login(&self) -> Option<&dyn AutoLogin> {
        None
    }

    fn as_scheduled_maintenance(&self) -> Option<&dyn ScheduledMaintenance> {
        None
    }
}

/// Exchanges the current token for a new one.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self) -> Result<(), AuthError>;
}

/// Establishes a session without explicit credentials.
#[async_trait]
pub trait AutoLogin: Send + Sync {
    async fn auto_login(&self) -> Result<(), AuthError>;
}

/// Reports whether a maintenance banner should be shown.
#[async_trait]
pub trait ScheduledMaintenance: Send + Sync {
    async fn fetch_scheduled_maintenance_state(
        &self,
    ) -> Result<ScheduledMaintenanceState, AuthError>;
}

/// The token slot plus the user derived from it.
///
/// The token is always written before the user, so anything observing a
/// completed login sees the new token. Once retired, the session no longer
/// writes to or clears the shared token store.
pub struct Session {
    tokens: TokenStore,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    user: Option<User>,
    retired: bool,
}

impl Session {
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            tokens,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn token(&self) -> Option<String> {
        if self.lock().retired {
            return None;
        }
        self.tokens.get()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    /// Stores a freshly issued token together with the user it belongs to.
    pub fn store(&self, token: &str, user: Option<User>) -> Result<(), AuthError> {
        let mut state = self.lock();
        if state.retired {
            return Err(AuthError::ProviderReplaced);
        }
        self.tokens.set(token)?;
        state.user = user;
        Ok(())
    }

    /// Overwrites the token and keeps the current user.
    pub fn replace_token(&self, token: &str) -> Result<(), AuthError> {
        let state = self.lock();
        if state.retired {
            return Err(AuthError::ProviderReplaced);
        }
        self.tokens.set(token)?;
        Ok(())
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        if state.retired {
            debug!("Session retired, leaving the token store alone");
            return;
        }
        self.tokens.clear();
        state.user = None;
    }

    /// Clears the token and detaches the session from the token store.
    /// Calls still in flight can no longer store or clear a token.
    pub fn retire(&self) {
        let mut state = self.lock();
        if !state.retired {
            self.tokens.clear();
            state.user = None;
            state.retired = true;
        }
    }
}

/// Records the analytics event for one login attempt.
pub fn record_login(analytics: &Analytics, label: &str, success: bool) {
    let action = if success {
        format!("Successfully logged in via {}", label)
    } else {
        format!("Failed to log in via {}", label)
    };
    analytics.record_event(LOGIN_CATEGORY, &action);
}

/// Finishes a login attempt: stores the session on success, clears it on
/// failure, and records the analytics event either way.
pub fn complete_login(
    session: &Session,
    analytics: &Analytics,
    label: &str,
    outcome: Result<(String, User), AuthError>,
) -> Result<(), AuthError> {
    let stored = outcome.and_then(|(token, user)| {
        let username = user.username.clone();
        session.store(&token, Some(user))?;
        Ok(username)
    });

    match stored {
        Err(AuthError::ProviderReplaced) => {
            debug!("Discarding {} login result, the provider was replaced", label);
            Err(AuthError::ProviderReplaced)
        }
        Ok(username) => {
            info!("User '{}' logged in via {}", username, label);
            record_login(analytics, label, true);
            Ok(())
        }
        Err(e) => {
            warn!("Login via {} failed: {}", label, e);
            session.clear();
            record_login(analytics, label, false);
            Err(e)
        }
    }
}

/// Builds the provider named by `config`. An unknown name, or a network
/// provider without an `auth_url`, is a deployment defect.
pub fn create_auth_provider(
    config: &AuthProviderConfig,
    context: &ProviderContext,
) -> Result<Arc<dyn AuthProvider>, ConfigError> {
    let (name, mnemonic) = match config.auth_provider.split_once('.') {
        Some((name, mnemonic)) => (name, Some(mnemonic)),
        None => (config.auth_provider.as_str(), None),
    };

    let auth_url = || {
        config
            .auth_url
            .clone()
            .ok_or_else(|| ConfigError::MissingAuthUrl(config.auth_provider.clone()))
    };

    let provider: Arc<dyn AuthProvider> = match name {
        "icat" => Arc::new(IcatAuthProvider::new(
            IcatAuthConfig {
                auth_url: auth_url()?,
                mnemonic: mnemonic.unwrap_or(super::icat_provider::DEFAULT_MNEMONIC).to_string(),
                anonymous_login: config.anonymous_login,
            },
            context,
        )),
        "jwt" => Arc::new(JwtAuthProvider::new(
            JwtAuthConfig {
                auth_url: auth_url()?,
            },
            context,
        )),
        "github" => Arc::new(GithubAuthProvider::new(
            GithubAuthConfig {
                auth_url: auth_url()?,
                client_id: config
                    .github_client_id
                    .clone()
                    .ok_or(ConfigError::MissingClientId)?,
            },
            context,
        )),
        "test" => Arc::new(TestAuthProvider::with_token_store(context.tokens.clone())),
        _ => {
            return Err(ConfigError::UnrecognisedProvider(
                config.auth_provider.clone(),
            ))
        }
    };

    info!(
        "Created auth provider '{}' of type '{}'",
        provider.get_name(),
        provider.get_type()
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ProviderContext {
        ProviderContext::new(TokenStore::in_memory(), Analytics::new())
    }

    fn config(name: &str, auth_url: Option<&str>) -> AuthProviderConfig {
        AuthProviderConfig {
            auth_provider: name.to_string(),
            auth_url: auth_url.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_known_providers() {
        let ctx = context();
        let jwt = create_auth_provider(&config("jwt", Some("http://localhost:8000")), &ctx).unwrap();
        assert_eq!(jwt.get_type(), "jwt");
        assert!(jwt.as_refresh().is_some());
        assert!(jwt.as_scheduled_maintenance().is_some());
        assert!(jwt.as_auto_login().is_none());

        let icat = create_auth_provider(&config("icat.ldap", Some("http://localhost:8000")), &ctx).unwrap();
        assert_eq!(icat.get_type(), "icat");
        assert_eq!(icat.get_name(), "ICAT (ldap)");
        assert!(icat.as_refresh().is_none());

        let test = create_auth_provider(&config("test", None), &ctx).unwrap();
        assert_eq!(test.get_type(), "test");
    }

    #[test]
    fn test_unrecognised_provider_is_rejected() {
        let err = create_auth_provider(&config("kerberos", Some("http://localhost")), &context())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnrecognisedProvider(ref name) if name == "kerberos"));
        assert!(err.to_string().starts_with("Unrecognised auth provider: kerberos"));
    }

    #[test]
    fn test_network_provider_requires_auth_url() {
        let err = create_auth_provider(&config("jwt", None), &context()).err().unwrap();
        assert!(matches!(err, ConfigError::MissingAuthUrl(_)));
    }

    #[test]
    fn test_github_requires_client_id() {
        let err = create_auth_provider(&config("github", Some("http://localhost")), &context())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingClientId));
    }

    #[test]
    fn test_session_store_and_clear() {
        let tokens = TokenStore::in_memory();
        let session = Session::new(tokens.clone());
        assert!(!session.is_logged_in());

        session.store("abc", Some(User::new("user"))).unwrap();
        assert_eq!(tokens.get(), Some("abc".to_string()));
        assert_eq!(session.user().unwrap().username, "user");

        session.replace_token("def").unwrap();
        assert_eq!(session.token(), Some("def".to_string()));
        assert_eq!(session.user().unwrap().username, "user");

        session.clear();
        assert!(!session.is_logged_in());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_retired_session_leaves_token_store_alone() {
        let tokens = TokenStore::in_memory();
        let session = Session::new(tokens.clone());
        session.store("old", Some(User::new("user"))).unwrap();

        session.retire();
        assert_eq!(tokens.get(), None);
        assert!(session.user().is_none());

        // A successor writes its own token to the shared slot.
        tokens.set("successor").unwrap();
        assert!(!session.is_logged_in());

        assert!(matches!(
            session.store("late", Some(User::new("user"))),
            Err(AuthError::ProviderReplaced)
        ));
        assert!(matches!(
            session.replace_token("late"),
            Err(AuthError::ProviderReplaced)
        ));
        session.clear();
        assert_eq!(tokens.get(), Some("successor".to_string()));
    }

    #[test]
    fn test_replaced_login_records_no_analytics() {
        let tokens = TokenStore::in_memory();
        let analytics = Analytics::new();
        let session = Session::new(tokens.clone());
        session.retire();
        tokens.set("successor").unwrap();

        let result = complete_login(
            &session,
            &analytics,
            "JWT",
            Ok(("late".to_string(), User::new("user"))),
        );
        assert!(matches!(result, Err(AuthError::ProviderReplaced)));
        assert_eq!(tokens.get(), Some("successor".to_string()));
        assert_eq!(analytics.event_count(LOGIN_CATEGORY, "Successfully logged in via JWT"), 0);
        assert_eq!(analytics.event_count(LOGIN_CATEGORY, "Failed to log in via JWT"), 0);
    }
}
