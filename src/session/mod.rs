//! Tracks the authenticated session and tells interested parts of the
//! application when it changes.
//!
//! The provider does not store sessions itself; the web layer keeps each
//! browser's session in a signed cookie (see [`cookie`]) and hands it back
//! through [`SessionProvider::get_session`], which refreshes it when the
//! access token is about to expire.

pub mod cookie;

use crate::components::{Credentials, IdentityService, Session, SignUpOutcome};
use crate::error::AppResult;
use crate::utils::time::now_timestamp;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, error, info, warn};

/// Kinds of authentication state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl fmt::Display for AuthChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthChangeEvent::SignedIn => "SIGNED_IN",
            AuthChangeEvent::SignedOut => "SIGNED_OUT",
            AuthChangeEvent::TokenRefreshed => "TOKEN_REFRESHED",
        };
        f.write_str(name)
    }
}

/// Notification delivered to auth state listeners
#[derive(Debug, Clone)]
pub struct AuthStateChange {
    pub event: AuthChangeEvent,
    /// User the change concerns
    pub user_id: String,
    /// The new session; absent after sign-out
    pub session: Option<Session>,
}

type Listener = Arc<dyn Fn(&AuthStateChange) + Send + Sync>;
type Listeners = Mutex<HashMap<u64, Listener>>;

fn lock(listeners: &Listeners) -> MutexGuard<'_, HashMap<u64, Listener>> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for a registered auth state listener.
/// The listener is removed when this is dropped or unsubscribed.
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Stop receiving notifications
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).remove(&self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Resolves sessions against the identity service and broadcasts auth state changes
pub struct SessionProvider {
    identity: Arc<dyn IdentityService>,
    listeners: Arc<Listeners>,
    next_listener_id: AtomicU64,
    refresh_margin_secs: i64,
}

impl fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionProvider")
            .field("listener_count", &self.listener_count())
            .field("refresh_margin_secs", &self.refresh_margin_secs)
            .finish()
    }
}

impl SessionProvider {
    /// Create a provider that refreshes sessions expiring within `refresh_margin_secs`
    pub fn new(identity: Arc<dyn IdentityService>, refresh_margin_secs: i64) -> Self {
        Self {
            identity,
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(1),
            refresh_margin_secs,
        }
    }

    /// Register a listener for sign-in, sign-out and token refresh notifications
    pub fn on_auth_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&AuthStateChange) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).insert(id, Arc::new(callback));
        debug!("Registered auth state listener {}", id);
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of active listeners
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn notify(&self, change: AuthStateChange) {
        info!("Auth state change {} for user {}", change.event, change.user_id);
        // Snapshot so listeners may subscribe or unsubscribe while being called
        let listeners: Vec<Listener> = lock(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener(&change);
        }
    }

    /// Resolve the current session from what the client stored.
    /// Expiring sessions are refreshed; a failed refresh means signed out.
    pub async fn get_session(&self, stored: Option<Session>) -> Option<Session> {
        let session = stored?;
        if !session.needs_refresh(now_timestamp(), self.refresh_margin_secs) {
            return Some(session);
        }

        debug!("Session for {} is expiring, refreshing", session.user_id());
        match self.identity.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => {
                self.notify(AuthStateChange {
                    event: AuthChangeEvent::TokenRefreshed,
                    user_id: refreshed.user_id().to_string(),
                    session: Some(refreshed.clone()),
                });
                Some(refreshed)
            }
            Err(e) => {
                warn!("Session refresh failed for {}: {}", session.user_id(), e);
                self.notify(AuthStateChange {
                    event: AuthChangeEvent::SignedOut,
                    user_id: session.user_id().to_string(),
                    session: None,
                });
                None
            }
        }
    }

    /// Sign in with email and password
    pub async fn sign_in_with_password(&self, credentials: &Credentials) -> AppResult<Session> {
        let session = self.identity.sign_in_with_password(credentials).await?;
        self.notify(AuthStateChange {
            event: AuthChangeEvent::SignedIn,
            user_id: session.user_id().to_string(),
            session: Some(session.clone()),
        });
        Ok(session)
    }

    /// Register a new account; signs in right away when the service returns a session
    pub async fn sign_up(&self, credentials: &Credentials) -> AppResult<SignUpOutcome> {
        let outcome = self.identity.sign_up(credentials).await?;
        if let Some(session) = &outcome.session {
            self.notify(AuthStateChange {
                event: AuthChangeEvent::SignedIn,
                user_id: session.user_id().to_string(),
                session: Some(session.clone()),
            });
        }
        Ok(outcome)
    }

    /// End the session. Listeners hear about the sign-out even when the
    /// service call fails, since the client forgets the session either way.
    pub async fn sign_out(&self, session: &Session) -> AppResult<()> {
        let result = self.identity.sign_out(&session.access_token).await;
        if let Err(e) = &result {
            error!("Sign-out request failed for {}: {}", session.user_id(), e);
        }
        self.notify(AuthStateChange {
            event: AuthChangeEvent::SignedOut,
            user_id: session.user_id().to_string(),
            session: None,
        });
        result
    }
}
