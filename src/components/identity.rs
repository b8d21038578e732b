use crate::error::AppResult;
use crate::utils::time::is_expiring;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Email and password as typed into the auth panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Identity as reported by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated session issued by the identity service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token (unix seconds)
    pub expires_at: i64,
    pub user: User,
}

impl Session {
    /// Identifier of the signed-in user
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Whether the access token should be refreshed before use
    pub fn needs_refresh(&self, now: i64, margin_secs: i64) -> bool {
        is_expiring(self.expires_at, now, margin_secs)
    }
}

/// Result of a sign-up request.
/// `session` is absent when the service requires email confirmation first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: Option<User>,
    pub session: Option<Session>,
}

/// The hosted identity service
#[async_trait]
pub trait IdentityService: Send + Sync + 'static {
    /// Register a new account
    async fn sign_up(&self, credentials: &Credentials) -> AppResult<SignUpOutcome>;

    /// Exchange email and password for a session
    async fn sign_in_with_password(&self, credentials: &Credentials) -> AppResult<Session>;

    /// Exchange a refresh token for a fresh session
    async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session>;

    /// Look up the user behind an access token; `None` when the token is not accepted
    async fn get_user(&self, access_token: &str) -> AppResult<Option<User>>;

    /// Terminate the session behind an access token
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;
}
