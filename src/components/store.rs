use super::identity::Session;
use crate::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// A user-owned calendar item as stored in the events table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Calendar date (YYYY-MM-DD)
    #[serde(default)]
    pub date: Option<String>,
    /// Clock time (HH:MM)
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Row sent when creating an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub completed: bool,
    pub user_id: String,
}

/// Full set of editable fields sent when updating an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventChanges {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
}

/// The hosted row store. Every call is scoped to the session's user by the store itself.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// All visible events, newest id first
    async fn list_events(&self, session: &Session) -> AppResult<Vec<Event>>;

    /// Insert one row
    async fn insert_event(&self, session: &Session, event: &NewEvent) -> AppResult<()>;

    /// Overwrite the editable fields of a row
    async fn update_event(
        &self,
        session: &Session,
        id: i64,
        changes: &EventChanges,
    ) -> AppResult<()>;

    /// Set only the completed flag of a row
    async fn set_completed(&self, session: &Session, id: i64, completed: bool) -> AppResult<()>;

    /// Remove a row
    async fn delete_event(&self, session: &Session, id: i64) -> AppResult<()>;
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_row() {
        let row = r#"{
            "id": 7,
            "title": "Standup",
            "description": null,
            "date": "2024-01-10",
            "time": "09:00",
            "location": null,
            "completed": null,
            "user_id": "user-1",
            "created_at": "2024-01-01T00:00:00Z"
        }"#;
        let event: Event = serde_json::from_str(row).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.title, "Standup");
        assert_eq!(event.date.as_deref(), Some("2024-01-10"));
        assert_eq!(event.description, None);
        // A null completed flag reads as not completed
        assert!(!event.completed);
    }

    #[test]
    fn test_event_with_missing_columns() {
        let event: Event = serde_json::from_str(r#"{"id": 1, "title": "Lunch"}"#).unwrap();
        assert!(!event.completed);
        assert_eq!(event.user_id, None);
    }

    #[test]
    fn test_changes_serialize_nulls() {
        let changes = EventChanges {
            title: "Standup".to_string(),
            description: None,
            date: Some("2024-01-10".to_string()),
            time: None,
            location: None,
        };
        let json = serde_json::to_value(&changes).unwrap();
        // Cleared fields are sent explicitly so the update overwrites them
        assert!(json.get("description").unwrap().is_null());
        assert_eq!(json["date"], "2024-01-10");
        assert!(json.get("completed").is_none());
    }
}
