use crate::components::{Credentials, Session};
use crate::session::SessionProvider;
use rust_i18n::t;
use serde::Deserialize;
use tracing::{info, warn};

/// Whether the panel signs in or registers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

impl AuthMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        }
    }

    /// Form value identifying the mode
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::SignIn => "sign_in",
            AuthMode::SignUp => "sign_up",
        }
    }
}

/// What a submit led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// A session was issued; the board takes over
    SignedIn(Session),
    /// Registered but no session yet (email confirmation pending)
    SignedUp,
    /// The service refused; the error is shown inline
    Failed,
}

/// Email/password form with a sign-in/sign-up switch
#[derive(Debug, Clone, Default)]
pub struct AuthPanel {
    pub email: String,
    pub password: String,
    mode: AuthMode,
    error: Option<String>,
    notice: Option<String>,
}

impl AuthPanel {
    /// Empty panel in the given mode
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Panel holding typed-in values
    pub fn with_input(mode: AuthMode, email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Switch between sign-in and sign-up
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Error returned by the last submit
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Confirmation shown after a successful sign-up
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Send the credentials to the identity service according to the mode
    pub async fn submit(&mut self, sessions: &SessionProvider) -> AuthOutcome {
        self.error = None;
        self.notice = None;

        let credentials = Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        };

        let outcome = match self.mode {
            AuthMode::SignIn => match sessions.sign_in_with_password(&credentials).await {
                Ok(session) => AuthOutcome::SignedIn(session),
                Err(e) => {
                    warn!("Sign-in failed for {}: {}", self.email, e);
                    self.error = Some(e.to_string());
                    AuthOutcome::Failed
                }
            },
            AuthMode::SignUp => match sessions.sign_up(&credentials).await {
                Ok(signed_up) => {
                    info!("Registered {}", self.email);
                    self.notice = Some(t!("auth_signup_success").to_string());
                    match signed_up.session {
                        Some(session) => AuthOutcome::SignedIn(session),
                        None => AuthOutcome::SignedUp,
                    }
                }
                Err(e) => {
                    warn!("Sign-up failed for {}: {}", self.email, e);
                    self.error = Some(e.to_string());
                    AuthOutcome::Failed
                }
            },
        };

        outcome
    }
}
