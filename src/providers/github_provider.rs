use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::base::{complete_login, AuthProvider, ProviderContext, Session};
use crate::analytics::Analytics;
use crate::error::AuthError;
use crate::models::User;
use crate::utils::http_helpers::{endpoint, post_json, read_json};

const LABEL: &str = "GitHub";
const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct GithubAuthConfig {
    pub auth_url: String,
    pub client_id: String,
}

/// Provider for GitHub OAuth. The user is sent to GitHub, which redirects
/// back with a one-time code; the auth service swaps that code for a token.
pub struct GithubAuthProvider {
    config: GithubAuthConfig,
    session: Session,
    analytics: Analytics,
    client: reqwest::Client,
}

#[derive(Deserialize, Debug)]
struct GithubTokenResponse {
    token: String,
    username: String,
    #[serde(default)]
    avatar: Option<String>,
}

impl GithubAuthProvider {
    pub fn new(config: GithubAuthConfig, context: &ProviderContext) -> Self {
        info!("Creating GitHub auth provider for '{}'", config.auth_url);
        Self {
            config,
            session: Session::new(context.tokens.clone()),
            analytics: context.analytics.clone(),
            client: context.client.clone(),
        }
    }

    /// Where to send the user to start the OAuth exchange.
    pub fn redirect_url(&self) -> String {
        format!("{}?client_id={}", GITHUB_AUTHORIZE_URL, self.config.client_id)
    }

    async fn exchange_code(&self, code: &str) -> Result<(String, User), AuthError> {
        let url = endpoint(&self.config.auth_url, "/api/github/authenticate");
        let response = post_json(&self.client, &url, &json!({ "code": code })).await?;
        let body: GithubTokenResponse = read_json(&url, response).await?;
        let user = User::new(body.username);
        let user = match body.avatar {
            Some(avatar) => user.with_avatar_url(avatar),
            None => user,
        };
        Ok((body.token, user))
    }
}

#[async_trait]
impl AuthProvider for GithubAuthProvider {
    fn get_name(&self) -> &str {
        "GitHub"
    }

    fn get_type(&self) -> &str {
        "github"
    }

    fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    fn user(&self) -> Option<User> {
        self.session.user()
    }

    /// `code` is the OAuth code GitHub redirected back with; there is no
    /// username/password exchange.
    async fn log_in(&self, _username: &str, code: &str) -> Result<(), AuthError> {
        if self.is_logged_in() {
            debug!("Already logged in, skipping GitHub code exchange");
            return Ok(());
        }
        let outcome = self.exchange_code(code).await;
        complete_login(&self.session, &self.analytics, LABEL, outcome)
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

        let url = endpoint(&self.config.auth_url, "/api/github/checkToken");
        match post_json(&self.client, &url, &json!({ "token": token })).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("GitHub token rejected, logging out: {}", e);
                self.session.clear();
                Err(e)
            }
        }
    }

    fn login_url(&self) -> Option<String> {
        Some(self.redirect_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::LOGIN_CATEGORY;
    use crate::store::TokenStore;
    use mockito::{Matcher, Server};

    fn provider(server: &Server) -> (GithubAuthProvider, TokenStore, Analytics) {
        let tokens = TokenStore::in_memory();
        let analytics = Analytics::new();
        let context = ProviderContext::new(tokens.clone(), analytics.clone());
        let provider = GithubAuthProvider::new(
            GithubAuthConfig {
                auth_url: server.url(),
                client_id: "client-id".to_string(),
            },
            &context,
        );
        (provider, tokens, analytics)
    }

    #[tokio::test]
    async fn test_redirect_url_carries_client_id() {
        let server = Server::new_async().await;
        let (provider, _, _) = provider(&server);
        assert_eq!(
            provider.redirect_url(),
            "https://github.com/login/oauth/authorize?client_id=client-id"
        );
    }

    #[tokio::test]
    async fn test_log_in_exchanges_code() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/github/authenticate")
            .match_body(Matcher::Json(json!({"code": "oauth-code"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token": "gh-token", "username": "octocat", "avatar": "https://avatars/octocat"}"#)
            .create_async()
            .await;
        let (provider, tokens, analytics) = provider(&server);

        provider.log_in("", "oauth-code").await.unwrap();
        m.assert_async().await;

        assert_eq!(tokens.get(), Some("gh-token".to_string()));
        let user = provider.user().unwrap();
        assert_eq!(user.username, "octocat");
        assert_eq!(user.avatar_url.as_deref(), Some("https://avatars/octocat"));
        assert_eq!(
            analytics.event_count(LOGIN_CATEGORY, "Successfully logged in via GitHub"),
            1
        );
    }

    #[tokio::test]
    async fn test_rejected_token_logs_out_without_refresh() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/github/checkToken")
            .with_status(403)
            .create_async()
            .await;
        let (provider, tokens, _) = provider(&server);
        tokens.set("gh-token").unwrap();

        assert!(provider.verify_log_in().await.is_err());
        m.assert_async().await;
        assert_eq!(tokens.get(), None);
        assert!(provider.as_refresh().is_none());
    }
}
