use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::base::{complete_login, AuthProvider, ProviderContext, Refresh, ScheduledMaintenance, Session};
use crate::analytics::Analytics;
use crate::error::AuthError;
use crate::models::{ScheduledMaintenanceState, User};
use crate::utils::http_helpers::{endpoint, get, post_json, read_json};

const LABEL: &str = "JWT";

/// JWT config: the base URL of the auth service.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct JwtAuthConfig {
    pub auth_url: String,
}

/// Provider for an auth service that issues bearer tokens and can refresh them.
pub struct JwtAuthProvider {
    config: JwtAuthConfig,
    session: Session,
    analytics: Analytics,
    client: reqwest::Client,
}

/// `{"token": "..."}`, returned by the login and refresh endpoints.
#[derive(Deserialize, Debug)]
struct TokenResponse {
    token: String,
}

impl JwtAuthProvider {
    pub fn new(config: JwtAuthConfig, context: &ProviderContext) -> Self {
        info!("Creating JWT auth provider for '{}'", config.auth_url);
        Self {
            config,
            session: Session::new(context.tokens.clone()),
            analytics: context.analytics.clone(),
            client: context.client.clone(),
        }
    }

    async fn request_token(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let url = endpoint(&self.config.auth_url, "/api/jwt/login");
        let response = post_json(
            &self.client,
            &url,
            &json!({ "username": username, "password": password }),
        )
        .await?;
        let body: TokenResponse = read_json(&url, response).await?;
        Ok(body.token)
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    fn get_name(&self) -> &str {
        "JWT"
    }

    fn get_type(&self) -> &str {
        "jwt"
    }

    fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    fn user(&self) -> Option<User> {
        self.session.user()
    }

    async fn log_in(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.is_logged_in() {
            debug!("Already logged in, skipping JWT login request");
            return Ok(());
        }

        let outcome = self
            .request_token(username, password)
            .await
            .map(|token| (token, User::new(username)));
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

        let url = endpoint(&self.config.auth_url, "/api/jwt/checkToken");
        match post_json(&self.client, &url, &json!({ "token": token })).await {
            Ok(_) => Ok(()),
            Err(e) => {
                debug!("Token check failed ({}), attempting refresh", e);
                self.refresh().await
            }
        }
    }

    fn as_refresh(&self) -> Option<&dyn Refresh> {
        Some(self)
    }

    fn as_scheduled_maintenance(&self) -> Option<&dyn ScheduledMaintenance> {
        Some(self)
    }
}

#[async_trait]
impl Refresh for JwtAuthProvider {
    async fn refresh(&self) -> Result<(), AuthError> {
        let url = endpoint(&self.config.auth_url, "/api/jwt/refresh");
        let result = async {
            let token = self.session.token().ok_or(AuthError::NotLoggedIn)?;
            let response = post_json(&self.client, &url, &json!({ "token": token })).await?;
            let body: TokenResponse = read_json(&url, response).await?;
            self.session.replace_token(&body.token)?;
            Ok(())
        }
        .await;

        if let Err(e) = &result {
            warn!("Token refresh failed, logging out: {}", e);
            self.session.clear();
        }
        result
    }
}

#[async_trait]
impl ScheduledMaintenance for JwtAuthProvider {
    async fn fetch_scheduled_maintenance_state(
        &self,
    ) -> Result<ScheduledMaintenanceState, AuthError> {
        let url = endpoint(&self.config.auth_url, "/api/jwt/scheduled_maintenance");
        let response = get(&self.client, &url).await?;
        read_json(&url, response).await
    }
}
