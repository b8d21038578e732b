use super::identity::{Credentials, IdentityService, Session, SignUpOutcome, User};
use super::store::{Event, EventChanges, EventStore, NewEvent};
use crate::error::{auth_error, store_error, AppResult};
use crate::utils::time::{expires_at_from, now_timestamp};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{RwLock, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    events: Vec<Event>,
    next_id: i64,
    /// Store calls to let through before failing, and the failure message
    injected_failure: Option<(usize, String)>,
}

/// Process-local stand-in for the hosted backend.
/// Rows are scoped to the caller's user the way row-level security scopes them.
#[derive(Debug)]
pub struct InMemoryBackend {
    state: RwLock<MemoryState>,
    token_lifetime_secs: i64,
    require_confirmation: bool,
    store_calls: AtomicUsize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend with autoconfirmed sign-ups and one-hour tokens
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1,
                ..Default::default()
            }),
            token_lifetime_secs: 3600,
            require_confirmation: false,
            store_calls: AtomicUsize::new(0),
        }
    }

    /// Issue tokens that expire after `secs` seconds
    pub fn with_token_lifetime(mut self, secs: i64) -> Self {
        self.token_lifetime_secs = secs;
        self
    }

    /// Require email confirmation: sign-up returns no session and sign-in is refused
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Number of row store calls served so far
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    /// Make the next row store call fail with `message`
    pub async fn fail_next_store_call(&self, message: &str) {
        self.fail_store_call_after(0, message).await;
    }

    /// Let `skip` row store calls succeed, then fail the following one with `message`
    pub async fn fail_store_call_after(&self, skip: usize, message: &str) {
        self.state.write().await.injected_failure = Some((skip, message.to_string()));
    }

    /// Revoke every outstanding token, as if the service had restarted
    pub async fn revoke_all_tokens(&self) {
        let mut state = self.state.write().await;
        state.access_tokens.clear();
        state.refresh_tokens.clear();
    }

    /// Current rows owned by `user_id`, newest first
    pub async fn rows_for(&self, user_id: &str) -> Vec<Event> {
        let state = self.state.read().await;
        let mut rows: Vec<Event> = state
            .events
            .iter()
            .filter(|e| e.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows
    }

    fn issue_session(&self, state: &mut MemoryState, user: User) -> Session {
        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();
        state.access_tokens.insert(access_token.clone(), user.id.clone());
        state.refresh_tokens.insert(refresh_token.clone(), user.id.clone());
        Session {
            access_token,
            refresh_token,
            expires_at: expires_at_from(now_timestamp(), self.token_lifetime_secs),
            user,
        }
    }

    /// Count the call, apply any injected failure and resolve the caller's user id
    async fn begin_store_call(
        &self,
        session: &Session,
    ) -> AppResult<RwLockWriteGuard<'_, MemoryState>> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        match state.injected_failure.take() {
            Some((0, message)) => return Err(store_error(&message)),
            Some((skip, message)) => state.injected_failure = Some((skip - 1, message)),
            None => {}
        }
        if !state.access_tokens.contains_key(&session.access_token) {
            return Err(store_error("JWT expired"));
        }
        Ok(state)
    }
}

fn owner_of(state: &MemoryState, access_token: &str) -> Option<String> {
    state.access_tokens.get(access_token).cloned()
}

#[async_trait]
impl IdentityService for InMemoryBackend {
    async fn sign_up(&self, credentials: &Credentials) -> AppResult<SignUpOutcome> {
        if credentials.password.len() < 6 {
            return Err(auth_error("Password should be at least 6 characters."));
        }

        let mut state = self.state.write().await;
        let email = credentials.email.trim().to_lowercase();
        if state.accounts.contains_key(&email) {
            return Err(auth_error("User already registered"));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: Some(email.clone()),
        };
        state.accounts.insert(
            email,
            Account {
                user: user.clone(),
                password: credentials.password.clone(),
                confirmed: !self.require_confirmation,
            },
        );

        let session = if self.require_confirmation {
            None
        } else {
            Some(self.issue_session(&mut state, user.clone()))
        };
        Ok(SignUpOutcome {
            user: Some(user),
            session,
        })
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> AppResult<Session> {
        let mut state = self.state.write().await;
        let email = credentials.email.trim().to_lowercase();
        let account = match state.accounts.get(&email) {
            Some(account) if account.password == credentials.password => account.clone(),
            _ => return Err(auth_error("Invalid login credentials")),
        };
        if !account.confirmed {
            return Err(auth_error("Email not confirmed"));
        }
        Ok(self.issue_session(&mut state, account.user))
    }

    async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session> {
        let mut state = self.state.write().await;
        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| auth_error("Invalid Refresh Token: Refresh Token Not Found"))?;
        let user = state
            .accounts
            .values()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or_else(|| auth_error("User not found"))?;
        Ok(self.issue_session(&mut state, user))
    }

    async fn get_user(&self, access_token: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        let user = owner_of(&state, access_token).and_then(|user_id| {
            state
                .accounts
                .values()
                .find(|a| a.user.id == user_id)
                .map(|a| a.user.clone())
        });
        Ok(user)
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(user_id) = state.access_tokens.remove(access_token) {
            // Signing out revokes every refresh token of the user
            state.refresh_tokens.retain(|_, owner| *owner != user_id);
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryBackend {
    async fn list_events(&self, session: &Session) -> AppResult<Vec<Event>> {
        let state = self.begin_store_call(session).await?;
        let owner = owner_of(&state, &session.access_token);
        let mut rows: Vec<Event> = state
            .events
            .iter()
            .filter(|e| e.user_id.is_some() && e.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn insert_event(&self, session: &Session, event: &NewEvent) -> AppResult<()> {
        let mut state = self.begin_store_call(session).await?;
        if owner_of(&state, &session.access_token).as_deref() != Some(event.user_id.as_str()) {
            return Err(store_error(
                "new row violates row-level security policy for table \"events\"",
            ));
        }
        if event.title.is_empty() {
            return Err(store_error(
                "null value in column \"title\" violates not-null constraint",
            ));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.events.push(Event {
            id,
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date.clone(),
            time: event.time.clone(),
            location: event.location.clone(),
            completed: event.completed,
            user_id: Some(event.user_id.clone()),
        });
        Ok(())
    }

    async fn update_event(
        &self,
        session: &Session,
        id: i64,
        changes: &EventChanges,
    ) -> AppResult<()> {
        let mut state = self.begin_store_call(session).await?;
        let owner = owner_of(&state, &session.access_token);
        // Rows of other users are invisible, so the update matches nothing
        if let Some(row) = state
            .events
            .iter_mut()
            .find(|e| e.id == id && e.user_id.is_some() && e.user_id == owner)
        {
            row.title = changes.title.clone();
            row.description = changes.description.clone();
            row.date = changes.date.clone();
            row.time = changes.time.clone();
            row.location = changes.location.clone();
        }
        Ok(())
    }

    async fn set_completed(&self, session: &Session, id: i64, completed: bool) -> AppResult<()> {
        let mut state = self.begin_store_call(session).await?;
        let owner = owner_of(&state, &session.access_token);
        if let Some(row) = state
            .events
            .iter_mut()
            .find(|e| e.id == id && e.user_id.is_some() && e.user_id == owner)
        {
            row.completed = completed;
        }
        Ok(())
    }

    async fn delete_event(&self, session: &Session, id: i64) -> AppResult<()> {
        let mut state = self.begin_store_call(session).await?;
        let owner = owner_of(&state, &session.access_token);
        state
            .events
            .retain(|e| !(e.id == id && e.user_id.is_some() && e.user_id == owner));
        Ok(())
    }
}
