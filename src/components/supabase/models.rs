use crate::components::identity::{Session, User};
use crate::utils::time::{expires_at_from, now_timestamp};
use serde::{Deserialize, Serialize};

/// Body of the password and refresh-token grants
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl TokenResponse {
    pub fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| expires_at_from(now_timestamp(), self.expires_in.unwrap_or(3600)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Error payloads differ between the auth and data APIs
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The most specific human-readable message in the payload
    pub fn message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_prefers_specific_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.message().as_deref(), Some("Invalid login credentials"));

        let body: ErrorBody =
            serde_json::from_str(r#"{"code": 422, "msg": "User already registered"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("User already registered"));

        let body: ErrorBody = serde_json::from_str(
            r#"{"code": "42501", "message": "new row violates row-level security policy", "details": null, "hint": null}"#,
        )
        .unwrap();
        assert_eq!(
            body.message().as_deref(),
            Some("new row violates row-level security policy")
        );
    }

    #[test]
    fn test_token_response_expiry() {
        let response: TokenResponse = serde_json::from_str(
            r#"{
                "access_token": "at",
                "token_type": "bearer",
                "expires_in": 3600,
                "expires_at": 1700003600,
                "refresh_token": "rt",
                "user": {"id": "user-1", "email": "a@example.com", "aud": "authenticated"}
            }"#,
        )
        .unwrap();
        let session = response.into_session();
        assert_eq!(session.expires_at, 1_700_003_600);
        assert_eq!(session.user_id(), "user-1");
        assert_eq!(session.user.email.as_deref(), Some("a@example.com"));
    }
}
