//! JWT access-token validation.

use axum::http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use super::claims::Claims;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing access token")]
    Missing,

    #[error("Invalid token")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Not an access token")]
    NotAccessToken,
}

/// Validates HS256 tokens signed with the backend's shared secret.
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Validate a token and return its claims. Refresh tokens are refused.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if !data.claims.is_access() {
            return Err(AuthError::NotAccessToken);
        }
        Ok(data.claims)
    }

    /// Validate the token from `Authorization: Bearer` or, for browsers that
    /// cannot set headers on a WebSocket upgrade, the `token` query parameter.
    pub fn authorize(&self, headers: &HeaderMap, query_token: Option<&str>) -> Result<Claims, AuthError> {
        let token = bearer_token(headers)
            .or(query_token)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Missing)?;
        self.validate(token)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
