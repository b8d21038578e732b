use crate::components::{Session, User};
use crate::error::AppResult;
use crate::utils::time::cookie_expiry;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the cookie carrying the signed session
pub const SESSION_COOKIE: &str = "eventboard_session";

/// Claims of the signed session cookie
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email of the user, when known
    pub email: Option<String>,
    /// Access token issued by the identity service
    pub access_token: String,
    /// Refresh token issued by the identity service
    pub refresh_token: String,
    /// Expiry of the access token (unix seconds)
    pub expires_at: i64,
    /// Expiration time of the cookie itself (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

/// Signs sessions into cookies and reads them back
pub struct SessionCodec {
    secret: String,
    lifetime_days: i64,
}

impl SessionCodec {
    /// Create a codec signing with `secret`; cookies stay valid for `lifetime_days`
    pub fn new(secret: &str, lifetime_days: i64) -> Self {
        Self {
            secret: secret.to_string(),
            lifetime_days,
        }
    }

    /// Sign a session into a token
    pub fn encode(&self, session: &Session) -> AppResult<String> {
        let now = Utc::now();
        let exp = cookie_expiry(now, self.lifetime_days);

        let claims = SessionClaims {
            sub: session.user.id.clone(),
            email: session.user.email.clone(),
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    /// Verify a token and turn it back into a session
    pub fn decode(&self, token: &str) -> AppResult<Session> {
        let claims = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?
        .claims;

        Ok(Session {
            access_token: claims.access_token,
            refresh_token: claims.refresh_token,
            expires_at: claims.expires_at,
            user: User {
                id: claims.sub,
                email: claims.email,
            },
        })
    }

    /// The session stored in the jar, if present and valid
    pub fn read(&self, jar: &CookieJar) -> Option<Session> {
        let cookie = jar.get(SESSION_COOKIE)?;
        match self.decode(cookie.value()) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("Ignoring invalid session cookie: {}", e);
                None
            }
        }
    }

    /// Store a session in the jar
    pub fn store(&self, jar: CookieJar, session: &Session) -> AppResult<CookieJar> {
        let token = self.encode(session)?;
        let cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(self.lifetime_days.max(1)));
        Ok(jar.add(cookie))
    }

    /// Remove the session from the jar
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }
}
