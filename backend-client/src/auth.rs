//! GoTrue auth payloads.

use boardsync_protocol::UserId;
use serde::{Deserialize, Serialize};

/// Email/password pair for sign-in and sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The auth-side user record. Distinct from the `user_profiles` row,
/// which the profile table serves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// An established session as returned by the token and signup endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}
