//! JWT claims issued by the auth backend.

use serde::{Deserialize, Serialize};

/// Claims carried by backend access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account e-mail).
    pub sub: String,
    /// Expiration (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,
    /// JWT ID.
    #[serde(default)]
    pub jti: Option<String>,
    /// Token type: "access" or "refresh".
    #[serde(rename = "type", default)]
    pub token_type: String,
    /// Account role: "parent", "expert" or "admin".
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl Claims {
    pub fn is_access(&self) -> bool {
        self.token_type == "access"
    }
}
