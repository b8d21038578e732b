mod auth;
pub mod models;
mod rest;

use crate::error::{config_error, AppResult};
use models::ErrorBody;
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;
use url::Url;

/// Client for a hosted Supabase project: GoTrue for identity, PostgREST for rows
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    anon_key: String,
    events_table: String,
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`
    pub fn new(base_url: &str, anon_key: &str, events_table: &str) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(&format!("Not a base URL: {}", base_url)));
        }
        // Url::join drops the last path segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            anon_key: anon_key.to_string(),
            events_table: events_table.to_string(),
        })
    }

    /// Resolve a path relative to the project URL
    fn endpoint(&self, path: &str) -> AppResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Start a request carrying the API key and the caller's bearer token.
    /// Without a user token the anon key doubles as bearer.
    fn request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        debug!("{} {}", method, url.path());
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }
}

/// Pull the human-readable message out of a failed response
pub(crate) async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());

    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {} - {}", status, body)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = SupabaseClient::new("https://project.supabase.co", "key", "events").unwrap();
        assert_eq!(
            client.endpoint("auth/v1/user").unwrap().as_str(),
            "https://project.supabase.co/auth/v1/user"
        );

        let client = SupabaseClient::new("http://localhost:54321/proxy", "key", "events").unwrap();
        assert_eq!(
            client.endpoint("rest/v1/events").unwrap().as_str(),
            "http://localhost:54321/proxy/rest/v1/events"
        );
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(SupabaseClient::new("not a url", "key", "events").is_err());
        assert!(SupabaseClient::new("mailto:someone@example.com", "key", "events").is_err());
    }
}
