use crate::error::{config_error, env_error, AppResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::warn;

/// Default location of the optional configuration file
pub const CONFIG_FILE: &str = "config/eventboard.toml";

/// Default name of the events table in the row store
pub const DEFAULT_EVENTS_TABLE: &str = "events";

/// Upper bound for the session cookie lifetime
pub const MAX_SESSION_LIFETIME_DAYS: i64 = 3650;

/// Which backend implementation serves auth and storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted GoTrue + PostgREST service
    Supabase,
    /// Process-local store, for local runs without a hosted project
    Memory,
}

impl BackendKind {
    fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(BackendKind::Supabase),
            "memory" => Ok(BackendKind::Memory),
            other => Err(config_error(&format!("Unknown backend '{}'", other))),
        }
    }
}

/// Main configuration structure for the web client
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend implementation to use
    pub backend: BackendKind,
    /// Base URL of the hosted project
    pub supabase_url: String,
    /// Public (anon) API key of the hosted project
    pub supabase_anon_key: String,
    /// Table holding the events
    pub events_table: String,
    /// Secret used to sign session cookies
    pub session_secret: String,
    /// How long a session cookie stays valid
    pub session_lifetime_days: i64,
    /// Sessions expiring within this many seconds are refreshed early
    pub session_refresh_margin_secs: i64,
    /// Boards untouched for this many seconds are dropped from memory
    pub board_idle_timeout_secs: u64,
    /// Address to bind the HTTP server to
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// UI locale
    pub locale: String,
    /// Directory with static assets
    pub assets_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Supabase,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            events_table: DEFAULT_EVENTS_TABLE.to_string(),
            session_secret: String::new(),
            session_lifetime_days: 7,
            session_refresh_margin_secs: 60,
            board_idle_timeout_secs: 3600,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            locale: "en".to_string(),
            assets_dir: "assets".to_string(),
        }
    }
}

/// Values that may be set in the configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    backend: Option<String>,
    supabase_url: Option<String>,
    events_table: Option<String>,
    session_lifetime_days: Option<i64>,
    session_refresh_margin_secs: Option<i64>,
    board_idle_timeout_secs: Option<u64>,
    bind_address: Option<String>,
    port: Option<u16>,
    locale: Option<String>,
    assets_dir: Option<String>,
}

impl Config {
    /// Load configuration from `.env`, the config file and the environment
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let file = fs::read_to_string(CONFIG_FILE).ok();
        Self::from_sources(|key| env::var(key).ok(), file.as_deref())
    }

    /// Build the configuration from an environment lookup and optional file contents.
    /// Environment variables override file values, which override defaults.
    pub fn from_sources<F>(lookup: F, file: Option<&str>) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(content) = file {
            let file_config: FileConfig = toml::from_str(content)?;
            config.apply_file(file_config)?;
        }

        if let Some(backend) = lookup("EVENTBOARD_BACKEND") {
            config.backend = BackendKind::parse(&backend)?;
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            config.supabase_url = url;
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            config.supabase_anon_key = key;
        }
        if let Some(table) = lookup("EVENTS_TABLE") {
            config.events_table = table;
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            config.session_secret = secret;
        }
        if let Some(days) = lookup("SESSION_LIFETIME_DAYS") {
            config.session_lifetime_days = parse_number("SESSION_LIFETIME_DAYS", &days)?;
        }
        if let Some(margin) = lookup("SESSION_REFRESH_MARGIN_SECS") {
            config.session_refresh_margin_secs =
                parse_number("SESSION_REFRESH_MARGIN_SECS", &margin)?;
        }
        if let Some(timeout) = lookup("BOARD_IDLE_TIMEOUT_SECS") {
            config.board_idle_timeout_secs = parse_number("BOARD_IDLE_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(address) = lookup("BIND_ADDRESS") {
            config.bind_address = parse_number("BIND_ADDRESS", &address)?;
        }
        if let Some(port) = lookup("PORT") {
            config.port = parse_number("PORT", &port)?;
        }
        if let Some(locale) = lookup("APP_LOCALE") {
            config.locale = locale;
        }
        if let Some(dir) = lookup("ASSETS_DIR") {
            config.assets_dir = dir;
        }

        if config.backend == BackendKind::Supabase {
            if config.supabase_url.is_empty() {
                return Err(env_error("SUPABASE_URL"));
            }
            if config.supabase_anon_key.is_empty() {
                return Err(env_error("SUPABASE_ANON_KEY"));
            }
        }

        config.validate()?;

        if config.session_secret.is_empty() {
            warn!("SESSION_SECRET not set, sessions will not survive a restart");
            config.session_secret = uuid::Uuid::new_v4().simple().to_string();
        }

        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> AppResult<()> {
        if let Some(backend) = file.backend {
            self.backend = BackendKind::parse(&backend)?;
        }
        if let Some(url) = file.supabase_url {
            self.supabase_url = url;
        }
        if let Some(table) = file.events_table {
            self.events_table = table;
        }
        if let Some(days) = file.session_lifetime_days {
            self.session_lifetime_days = days;
        }
        if let Some(margin) = file.session_refresh_margin_secs {
            self.session_refresh_margin_secs = margin;
        }
        if let Some(timeout) = file.board_idle_timeout_secs {
            self.board_idle_timeout_secs = timeout;
        }
        if let Some(address) = file.bind_address {
            self.bind_address = parse_number("bind_address", &address)?;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(locale) = file.locale {
            self.locale = locale;
        }
        if let Some(dir) = file.assets_dir {
            self.assets_dir = dir;
        }
        Ok(())
    }

    fn validate(&self) -> AppResult<()> {
        if !(1..=MAX_SESSION_LIFETIME_DAYS).contains(&self.session_lifetime_days) {
            return Err(config_error(&format!(
                "session_lifetime_days must be between 1 and {}, got {}",
                MAX_SESSION_LIFETIME_DAYS, self.session_lifetime_days
            )));
        }
        if self.session_refresh_margin_secs < 0 {
            return Err(config_error(&format!(
                "session_refresh_margin_secs must not be negative, got {}",
                self.session_refresh_margin_secs
            )));
        }
        if self.board_idle_timeout_secs == 0 {
            return Err(config_error("board_idle_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Socket address the server listens on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| config_error(&format!("Invalid {} value: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_requires_supabase_credentials() {
        let err = Config::from_sources(lookup(&[]), None).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_URL"));

        let err = Config::from_sources(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]), None)
            .unwrap_err();
        assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        let config =
            Config::from_sources(lookup(&[("EVENTBOARD_BACKEND", "memory")]), None).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.events_table, "events");
        assert_eq!(config.port, 3000);
        // A random secret is generated when none is configured
        assert!(!config.session_secret.is_empty());
    }

    #[test]
    fn test_env_overrides_file() {
        let file = r#"
            backend = "memory"
            port = 8080
            locale = "fi"
            events_table = "calendar_events"
        "#;
        let config = Config::from_sources(lookup(&[("PORT", "9090")]), Some(file)).unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.port, 9090);
        assert_eq!(config.locale, "fi");
        assert_eq!(config.events_table, "calendar_events");
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn test_rejects_invalid_values() {
        let result = Config::from_sources(
            lookup(&[("EVENTBOARD_BACKEND", "memory"), ("PORT", "not-a-port")]),
            None,
        );
        assert!(result.is_err());

        let result = Config::from_sources(lookup(&[("EVENTBOARD_BACKEND", "redis")]), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_lifetime_is_bounded() {
        for days in ["100000000", "0", "-1"] {
            let err = Config::from_sources(
                lookup(&[("EVENTBOARD_BACKEND", "memory"), ("SESSION_LIFETIME_DAYS", days)]),
                None,
            )
            .unwrap_err();
            assert!(err.to_string().contains("session_lifetime_days"), "{}", err);
        }

        let file = "backend = \"memory\"\nsession_lifetime_days = 100000000\n";
        assert!(Config::from_sources(lookup(&[]), Some(file)).is_err());

        let config = Config::from_sources(
            lookup(&[("EVENTBOARD_BACKEND", "memory"), ("SESSION_LIFETIME_DAYS", "3650")]),
            None,
        )
        .unwrap();
        assert_eq!(config.session_lifetime_days, MAX_SESSION_LIFETIME_DAYS);
    }

    #[test]
    fn test_rejects_negative_margin_and_zero_idle_timeout() {
        let memory = ("EVENTBOARD_BACKEND", "memory");
        let result =
            Config::from_sources(lookup(&[memory, ("SESSION_REFRESH_MARGIN_SECS", "-5")]), None);
        assert!(result.is_err());

        let result =
            Config::from_sources(lookup(&[memory, ("BOARD_IDLE_TIMEOUT_SECS", "0")]), None);
        assert!(result.is_err());

        let config =
            Config::from_sources(lookup(&[memory, ("BOARD_IDLE_TIMEOUT_SECS", "120")]), None)
                .unwrap();
        assert_eq!(config.board_idle_timeout_secs, 120);
    }
}
