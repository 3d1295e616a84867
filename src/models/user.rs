//! User model and authentication payloads

use serde::{Deserialize, Serialize};

/// Profile of the authenticated admin, as returned by `/me/` and `/login/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
}

/// Login / registration request body
#[derive(Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Token issuance response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token used for every authenticated call
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    pub user: UserProfile,
}

/// `{"detail": "..."}` error body
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub detail: String,
}
