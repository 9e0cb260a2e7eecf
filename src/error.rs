//! Error types shared across the gateway.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised by a [`crate::store::Storage`] backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not a JSON object of strings: {0}")]
    Format(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Failures raised by an auth provider operation.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("no token is stored")]
    NotLoggedIn,

    #[error("the auth provider is still loading")]
    ProviderLoading,

    #[error("the auth provider was replaced")]
    ProviderReplaced,

    #[error("failed to persist token: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// The HTTP status the server rejected the call with, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuthError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Deployment/configuration defects. These are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Unrecognised auth provider: {0}, this is a development issue as there is no implementation registered for this provider."
    )]
    UnrecognisedProvider(String),

    #[error("auth provider '{0}' requires an auth_url")]
    MissingAuthUrl(String),

    #[error("auth provider 'github' requires a github_client_id")]
    MissingClientId,

    #[error(
        "invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error"
    )]
    InvalidLogLevel(String),

    #[error("error loading configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Failures raised while reducing an action into the gateway state.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("malformed payload for action '{action}': {source}")]
    Payload {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("action '{0}' requires a payload")]
    MissingPayload(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("auth provider '{provider}' does not support {capability}")]
    Unsupported {
        provider: String,
        capability: &'static str,
    },

    #[error("gateway state lock poisoned")]
    Poisoned,
}
