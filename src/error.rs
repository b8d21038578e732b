use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Rejected by the identity service; the message is shown verbatim
    #[error("{0}")]
    #[diagnostic(code(eventboard::auth))]
    Auth(String),

    /// Rejected by the row store; the message is shown verbatim
    #[error("{0}")]
    #[diagnostic(code(eventboard::store))]
    Store(String),

    #[error("{0}")]
    #[diagnostic(code(eventboard::validation))]
    Validation(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(eventboard::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(eventboard::config))]
    Config(String),

    #[error("Session error: {0}")]
    #[diagnostic(code(eventboard::session))]
    Session(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(eventboard::http))]
    Http(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    #[diagnostic(code(eventboard::template))]
    Template(#[from] askama::Error),

    #[error(transparent)]
    #[diagnostic(code(eventboard::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(eventboard::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(eventboard::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Session(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create identity service errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create row store errors
pub fn store_error(message: &str) -> Error {
    Error::Store(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
