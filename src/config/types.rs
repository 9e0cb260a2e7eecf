use std::path::Path;

use figment::providers::{Env, Format, Json, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::error::ConfigError;
use crate::providers::AuthProviderConfig;

/// Environment variables with this prefix override the settings file,
/// e.g. `SCIGATEWAY_AUTH_URL`.
pub const ENV_PREFIX: &str = "SCIGATEWAY_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Site settings for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
pub struct ConfigV1 {
    /// `icat`, `icat.<mnemonic>`, `jwt`, `github` or `test`.
    pub auth_provider: String,
    pub auth_url: Option<String>,
    pub github_client_id: Option<String>,
    #[serde(default)]
    pub anonymous_login: bool,
    pub ga_tracking_id: Option<String>,
    #[serde(default)]
    pub storage: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigV1 {
    pub fn auth_provider_config(&self) -> AuthProviderConfig {
        AuthProviderConfig {
            auth_provider: self.auth_provider.clone(),
            auth_url: self.auth_url.clone(),
            github_client_id: self.github_client_id.clone(),
            anonymous_login: self.anonymous_login,
        }
    }
}

/// Load settings from `path` (YAML, or JSON when the extension is `.json`),
/// with `SCIGATEWAY_*` environment variables layered on top.
pub fn load_config(path: &Path) -> Result<ConfigV1, ConfigError> {
    let figment = Figment::new();
    let figment = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Yaml::file(path)),
    };
    let figment = figment.merge(Env::prefixed(ENV_PREFIX));

    let config = figment
        .extract::<Config>()
        .map_err(|e| ConfigError::Load(Box::new(e)))?;
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// The JSON schema for the settings file, pretty-printed.
pub fn config_schema() -> String {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    println!("{}", config_schema());
}
