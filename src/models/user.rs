use std::collections::HashSet;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// The User struct represents the person behind the current token.
///
/// It is never persisted on its own: providers rebuild it from the login
/// request or by decoding the token's claims.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    /// Session identifier echoed by ICAT tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Claims an ICAT session token carries.
#[derive(Deserialize, Debug)]
struct SessionClaims {
    username: String,
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        User {
            username: username.into(),
            session_id: None,
            avatar_url: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Reads the user out of a JWT's claims without checking its signature.
    /// The server that issued the token stays the only authority on validity.
    pub fn from_token_claims(token: &str) -> Result<User, String> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let decoded = decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| format!("Failed to decode token claims: {}", e))?;

        let claims = decoded.claims;
        let user = User::new(claims.username);
        Ok(match claims.session_id {
            Some(session_id) => user.with_session_id(session_id),
            None => user,
        })
    }
}
