use super::models::{RefreshRequest, TokenResponse};
use super::{error_message, SupabaseClient};
use crate::components::identity::{Credentials, IdentityService, Session, SignUpOutcome, User};
use crate::error::{auth_error, AppResult};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

impl SupabaseClient {
    /// POST to the token endpoint with the given grant
    async fn token_grant<B>(&self, grant_type: &str, body: &B) -> AppResult<Session>
    where
        B: serde::Serialize + ?Sized + Sync,
    {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self.request(Method::POST, url, None).json(body).send().await?;
        if !response.status().is_success() {
            return Err(auth_error(&error_message(response).await));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl IdentityService for SupabaseClient {
    async fn sign_up(&self, credentials: &Credentials) -> AppResult<SignUpOutcome> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .request(Method::POST, url, None)
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(&error_message(response).await));
        }

        // With autoconfirm the service answers with a full session, otherwise with the bare user
        let body: Value = response.json().await?;
        if body.get("access_token").is_some() {
            let session = serde_json::from_value::<TokenResponse>(body)?.into_session();
            debug!("Sign-up returned a session for {}", session.user_id());
            return Ok(SignUpOutcome {
                user: Some(session.user.clone()),
                session: Some(session),
            });
        }

        let user = serde_json::from_value::<User>(body).ok();
        Ok(SignUpOutcome { user, session: None })
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> AppResult<Session> {
        self.token_grant("password", credentials).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session> {
        self.token_grant("refresh_token", &RefreshRequest { refresh_token })
            .await
    }

    async fn get_user(&self, access_token: &str) -> AppResult<Option<User>> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .request(Method::GET, url, Some(access_token))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            _ => Err(auth_error(&error_message(response).await)),
        }
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // The token is already gone on the server side
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(auth_error(&error_message(response).await)),
        }
    }
}
