use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::AuthError;

/// Joins a configured base URL and an endpoint path, tolerating a trailing
/// slash on the base.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// POSTs a JSON body and returns the response if the server answered 2xx.
/// Any other status is surfaced as [`AuthError::Status`].
pub async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &B,
) -> Result<Response, AuthError> {
    debug!("Sending POST request to: {}", url);
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|source| AuthError::Transport {
            url: url.to_string(),
            source,
        })?;
    check_status(url, response)
}

/// GETs a URL and returns the response if the server answered 2xx.
pub async fn get(client: &Client, url: &str) -> Result<Response, AuthError> {
    debug!("Sending GET request to: {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| AuthError::Transport {
            url: url.to_string(),
            source,
        })?;
    check_status(url, response)
}

fn check_status(url: &str, response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AuthError::Status {
            url: url.to_string(),
            status,
        })
    }
}

/// Reads a JSON response body into `T`.
pub async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, AuthError> {
    let body = read_text(url, response).await?;
    serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse {
        url: url.to_string(),
        reason: format!("Error parsing JSON: {}", e),
    })
}

/// Reads a response body as text.
pub async fn read_text(url: &str, response: Response) -> Result<String, AuthError> {
    response.text().await.map_err(|e| AuthError::InvalidResponse {
        url: url.to_string(),
        reason: format!("Error reading response body: {}", e),
    })
}
