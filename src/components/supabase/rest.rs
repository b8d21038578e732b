use super::{error_message, SupabaseClient};
use crate::components::identity::Session;
use crate::components::store::{Event, EventChanges, EventStore, NewEvent};
use crate::error::{store_error, AppResult};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::json;
use url::Url;

impl SupabaseClient {
    fn table_url(&self) -> AppResult<Url> {
        self.endpoint(&format!("rest/v1/{}", self.events_table))
    }

    /// URL addressing a single row by id
    fn row_url(&self, id: i64) -> AppResult<Url> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    /// Send a write and discard the (minimal) response body
    async fn send_write(&self, request: RequestBuilder) -> AppResult<()> {
        let response = request.header("Prefer", "return=minimal").send().await?;
        if !response.status().is_success() {
            return Err(store_error(&error_message(response).await));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for SupabaseClient {
    async fn list_events(&self, session: &Session) -> AppResult<Vec<Event>> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "id.desc");

        let response = self
            .request(Method::GET, url, Some(&session.access_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(store_error(&error_message(response).await));
        }

        Ok(response.json().await?)
    }

    async fn insert_event(&self, session: &Session, event: &NewEvent) -> AppResult<()> {
        let request = self
            .request(Method::POST, self.table_url()?, Some(&session.access_token))
            .json(&[event]);
        self.send_write(request).await
    }

    async fn update_event(
        &self,
        session: &Session,
        id: i64,
        changes: &EventChanges,
    ) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, self.row_url(id)?, Some(&session.access_token))
            .json(changes);
        self.send_write(request).await
    }

    async fn set_completed(&self, session: &Session, id: i64, completed: bool) -> AppResult<()> {
        let request = self
            .request(Method::PATCH, self.row_url(id)?, Some(&session.access_token))
            .json(&json!({ "completed": completed }));
        self.send_write(request).await
    }

    async fn delete_event(&self, session: &Session, id: i64) -> AppResult<()> {
        let request = self.request(Method::DELETE, self.row_url(id)?, Some(&session.access_token));
        self.send_write(request).await
    }
}
