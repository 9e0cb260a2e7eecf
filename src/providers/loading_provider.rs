use async_trait::async_trait;

use super::base::AuthProvider;
use crate::error::AuthError;
use crate::models::User;

/// Placeholder installed before the site settings name a real provider.
/// It is never logged in and refuses every exchange.
#[derive(Default)]
pub struct LoadingAuthProvider;

impl LoadingAuthProvider {
    pub fn new() -> Self {
        LoadingAuthProvider
    }
}

#[async_trait]
impl AuthProvider for LoadingAuthProvider {
    fn get_name(&self) -> &str {
        "Loading"
    }

    fn get_type(&self) -> &str {
        "loading"
    }

    fn is_logged_in(&self) -> bool {
        false
    }

    fn user(&self) -> Option<User> {
        None
    }

    async fn log_in(&self, _username: &str, _password: &str) -> Result<(), AuthError> {
        Err(AuthError::ProviderLoading)
    }

    fn log_out(&self) {}

    async fn verify_log_in(&self) -> Result<(), AuthError> {
        Err(AuthError::ProviderLoading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loading_provider_refuses_everything() {
        let provider = LoadingAuthProvider::new();
        assert!(!provider.is_logged_in());
        assert!(matches!(
            provider.log_in("user", "password").await,
            Err(AuthError::ProviderLoading)
        ));
        assert!(matches!(
            provider.verify_log_in().await,
            Err(AuthError::ProviderLoading)
        ));
        provider.log_out();
        assert!(provider.as_refresh().is_none());
        assert!(provider.as_auto_login().is_none());
        assert!(provider.as_scheduled_maintenance().is_none());
    }
}
