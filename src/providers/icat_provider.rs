use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::base::{complete_login, AuthProvider, AutoLogin, ProviderContext, Session};
use crate::analytics::Analytics;
use crate::error::AuthError;
use crate::models::User;
use crate::utils::http_helpers::{endpoint, post_json, read_text};

const LABEL: &str = "ICAT";

/// Authenticator plugin used when the selection string carries no mnemonic.
pub const DEFAULT_MNEMONIC: &str = "simple";

/// Authenticator plugin used for anonymous sessions.
pub const ANONYMOUS_MNEMONIC: &str = "anon";

/// Config for an ICAT session provider.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct IcatAuthConfig {
    pub auth_url: String,
    /// The ICAT authenticator plugin to log in through (e.g. "simple", "ldap").
    pub mnemonic: String,
    #[serde(default)]
    pub anonymous_login: bool,
}

/// Provider for a multi-tenant ICAT server. Tokens are JWTs whose claims
/// carry the username and ICAT session id.
pub struct IcatAuthProvider {
    config: IcatAuthConfig,
    name: String,
    session: Session,
    analytics: Analytics,
    client: reqwest::Client,
}

impl IcatAuthProvider {
    pub fn new(config: IcatAuthConfig, context: &ProviderContext) -> Self {
        info!(
            "Creating ICAT auth provider for '{}', mnemonic='{}'",
            config.auth_url, config.mnemonic
        );
        Self {
            name: format!("ICAT ({})", config.mnemonic),
            config,
            session: Session::new(context.tokens.clone()),
            analytics: context.analytics.clone(),
            client: context.client.clone(),
        }
    }

    async fn request_session(
        &self,
        mnemonic: &str,
        username: &str,
        password: &str,
    ) -> Result<(String, User), AuthError> {
        let url = endpoint(&self.config.auth_url, "/login");
        let response = post_json(
            &self.client,
            &url,
            &json!({
                "mnemonic": mnemonic,
                "credentials": { "username": username, "password": password },
            }),
        )
        .await?;
        let token = parse_raw_token(&read_text(&url, response).await?);
        let user = User::from_token_claims(&token)
            .map_err(|reason| AuthError::InvalidResponse { url, reason })?;
        Ok((token, user))
    }

    async fn log_in_with(&self, mnemonic: &str, username: &str, password: &str) -> Result<(), AuthError> {
        let outcome = self.request_session(mnemonic, username, password).await;
        complete_login(&self.session, &self.analytics, LABEL, outcome)
    }
}

/// The login endpoint answers with the bare token, either as plain text or
/// as a JSON string literal.
fn parse_raw_token(body: &str) -> String {
    serde_json::from_str::<String>(body).unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl AuthProvider for IcatAuthProvider {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_type(&self) -> &str {
        "icat"
    }

    fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Decoded from the stored token each time, so a token that survived a
    /// restart still yields its user.
    fn user(&self) -> Option<User> {
        self.session
            .user()
            .or_else(|| User::from_token_claims(&self.session.token()?).ok())
    }

    async fn log_in(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.is_logged_in() {
            debug!("Already logged in, skipping ICAT login request");
            return Ok(());
        }
        self.log_in_with(&self.config.mnemonic, username, password).await
    }

    fn log_out(&self) {
        self.session.clear();
    }

    fn retire(&self) {
        self.session.retire();
    }

    async fn verify_log_in(&self) -> Result<(), AuthError> {
        let Some(token) = self.session.token() else {
            self.session.clear();
            return Err(AuthError::NotLoggedIn);
        };

        let url = endpoint(&self.config.auth_url, "/verify");
        match post_json(&self.client, &url, &json!({ "token": token })).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("ICAT session verification failed, logging out: {}", e);
                self.session.clear();
                Err(e)
            }
        }
    }

    fn as_auto_login(&self) -> Option<&dyn AutoLogin> {
        if self.config.anonymous_login {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl AutoLogin for IcatAuthProvider {
    async fn auto_login(&self) -> Result<(), AuthError> {
        debug!("Attempting anonymous ICAT login");
        self.log_in_with(ANONYMOUS_MNEMONIC, "", "").await
    }
}
