use async_trait::async_trait;
use tracing::debug;

use super::base::{AuthProvider, Session};
use crate::error::AuthError;
use crate::models::User;
use crate::store::TokenStore;

/// A provider that never touches the network. The token and user are built
/// directly from the arguments, for exercising the rest of the gateway in
/// isolation.
pub struct TestAuthProvider {
    session: Session,
}

impl TestAuthProvider {
    /// A provider with its own in-memory token slot, optionally pre-seeded.
    pub fn new(token: Option<&str>) -> Self {
        let tokens = TokenStore::in_memory();
        if let Some(token) = token {
            // In-memory storage cannot fail to write.
            let _ = tokens.set(token);
        }
        Self::with_token_store(tokens)
    }

    pub fn with_token_store(tokens: TokenStore) -> Self {
        Self {
            session: Session::new(tokens),
        }
    }
}

#[async_trait]
impl AuthProvider for TestAuthProvider {
    fn get_name(&self) -> &str {
        "Test"
    }

    fn get_type(&self) -> &str {
        "test"
    }

    fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    fn user(&self) -> Option<User> {
        self.session.user()
    }

    async fn log_in(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.is_logged_in() {
            return Ok(());
        }
        debug!("Test provider logging in '{}'", username);
        let token = format!("{}:{}", username, password);
        self.session.store(&token, Some(User::new(username)))?;
        Ok(())
    }

    fn log_out(&self) {
        self.session.clear();
    }

    fn retire(&self) {
        self.session.retire();
    }

    async fn verify_log_in(&self) -> Result<(), AuthError> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(AuthError::NotLoggedIn)
        }
    }
}
