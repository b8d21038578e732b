use crate::components::{Backend, Event, EventChanges, NewEvent, Session};
use crate::error::{validation_error, Error};
use rust_i18n::t;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Contents of the create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
}

impl EventForm {
    /// Pre-fill the form from an existing row
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            date: event.date.clone().unwrap_or_default(),
            time: event.time.clone().unwrap_or_default(),
            location: event.location.clone().unwrap_or_default(),
        }
    }

    /// Whether the form may be submitted. Only the title is required.
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    /// Row for a new event owned by `user_id`
    pub fn to_new_event(&self, user_id: &str) -> NewEvent {
        NewEvent {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            date: Some(self.date.clone()),
            time: Some(self.time.clone()),
            location: Some(self.location.clone()),
            completed: false,
            user_id: user_id.to_string(),
        }
    }

    /// Full update of the editable fields; inputs are sent as typed
    pub fn to_changes(&self) -> EventChanges {
        EventChanges {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            date: Some(self.date.clone()),
            time: Some(self.time.clone()),
            location: Some(self.location.clone()),
        }
    }
}

/// What the form is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Creating,
    Editing(i64),
}

/// Answer to the delete confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
}

/// Result of a board action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The backend accepted the change and the list was reloaded
    Done,
    /// Refused locally before any request was made
    Rejected,
    /// The backend refused; an alert is pending
    Failed,
    /// The user declined the confirmation
    Cancelled,
}

/// One user's event board: the list snapshot, the form and pending alerts.
///
/// Every successful mutation is followed by a full reload of the list, and
/// every failure is surfaced as an alert while the previous state is kept.
#[derive(Debug, Default)]
pub struct EventBoard {
    events: Vec<Event>,
    form: EventForm,
    edit_target: Option<i64>,
    loading: bool,
    alerts: Vec<String>,
    fresh: bool,
}

impl EventBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot returned by the last successful fetch
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Current form contents
    pub fn form(&self) -> &EventForm {
        &self.form
    }

    /// Replace the form contents with what the user typed
    pub fn set_form(&mut self, form: EventForm) {
        self.form = form;
    }

    /// Row being edited, if any
    pub fn edit_target(&self) -> Option<i64> {
        self.edit_target
    }

    /// Whether the form creates or updates
    pub fn mode(&self) -> FormMode {
        match self.edit_target {
            Some(id) => FormMode::Editing(id),
            None => FormMode::Creating,
        }
    }

    /// Whether a fetch or submit is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Alerts waiting to be shown
    pub fn pending_alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Queue an alert for display
    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push(message.into());
    }

    /// Take the pending alerts; each is shown once
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    fn surface(&mut self, action: &str, err: Error) {
        warn!("{} failed: {}", action, err);
        self.alerts.push(err.to_string());
    }

    fn clear_form(&mut self) {
        self.form = EventForm::default();
    }

    /// Called when the board is shown. Fetches the list unless the action
    /// that led here has just attempted a reload.
    pub async fn mount(&mut self, backend: &Backend, session: &Session) {
        if std::mem::take(&mut self.fresh) {
            return;
        }
        self.list(backend, session).await;
    }

    /// Reload after a successful mutation. A failed reload has already
    /// queued its alert, so the next mount does not fetch again.
    async fn reload(&mut self, backend: &Backend, session: &Session) {
        self.list(backend, session).await;
        self.fresh = true;
    }

    /// Fetch all of the user's events, newest first.
    /// On failure the alert is queued and the previous list kept.
    pub async fn list(&mut self, backend: &Backend, session: &Session) -> Outcome {
        self.loading = true;
        let result = backend.store.list_events(session).await;
        self.loading = false;

        match result {
            Ok(events) => {
                debug!("Loaded {} events for {}", events.len(), session.user_id());
                self.events = events;
                Outcome::Done
            }
            Err(e) => {
                self.surface("Loading events", e);
                Outcome::Failed
            }
        }
    }

    /// Submit the form: update the edit target if set, otherwise create a new event
    pub async fn submit(&mut self, backend: &Backend, session: &Session) -> Outcome {
        if !self.form.has_title() {
            self.alerts.push(t!("alert_title_required").to_string());
            return Outcome::Rejected;
        }

        match self.edit_target {
            Some(id) => self.update(backend, session, id).await,
            None => self.create(backend, session).await,
        }
    }

    async fn create(&mut self, backend: &Backend, session: &Session) -> Outcome {
        self.loading = true;

        // The user is looked up again instead of trusting the session
        let user = match backend.identity.get_user(&session.access_token).await {
            Ok(Some(user)) => user,
            result => {
                if let Err(e) = result {
                    warn!("User lookup failed: {}", e);
                }
                self.loading = false;
                self.surface(
                    "Resolving the current user",
                    validation_error(&t!("alert_user_not_found")),
                );
                return Outcome::Failed;
            }
        };

        let row = self.form.to_new_event(&user.id);
        let result = backend.store.insert_event(session, &row).await;
        self.loading = false;

        match result {
            Ok(()) => {
                info!("Created event '{}' for {}", row.title, user.id);
                self.clear_form();
                self.reload(backend, session).await;
                Outcome::Done
            }
            Err(e) => {
                self.surface("Creating an event", e);
                Outcome::Failed
            }
        }
    }

    async fn update(&mut self, backend: &Backend, session: &Session, id: i64) -> Outcome {
        self.loading = true;
        let result = backend
            .store
            .update_event(session, id, &self.form.to_changes())
            .await;
        self.loading = false;

        match result {
            Ok(()) => {
                info!("Updated event {} for {}", id, session.user_id());
                self.edit_target = None;
                self.clear_form();
                self.reload(backend, session).await;
                Outcome::Done
            }
            Err(e) => {
                self.surface("Updating an event", e);
                Outcome::Failed
            }
        }
    }

    /// Flip the completed flag of a row in the current snapshot
    pub async fn toggle_complete(
        &mut self,
        backend: &Backend,
        session: &Session,
        id: i64,
    ) -> Outcome {
        let Some(completed) = self.events.iter().find(|e| e.id == id).map(|e| e.completed) else {
            debug!("Toggle for unknown event {}", id);
            return Outcome::Rejected;
        };

        match backend.store.set_completed(session, id, !completed).await {
            Ok(()) => {
                self.reload(backend, session).await;
                Outcome::Done
            }
            Err(e) => {
                self.surface("Toggling an event", e);
                Outcome::Failed
            }
        }
    }

    /// Delete a row once the user has confirmed
    pub async fn delete(
        &mut self,
        backend: &Backend,
        session: &Session,
        id: i64,
        confirmation: Confirmation,
    ) -> Outcome {
        if confirmation == Confirmation::Declined {
            return Outcome::Cancelled;
        }

        match backend.store.delete_event(session, id).await {
            Ok(()) => {
                info!("Deleted event {} for {}", id, session.user_id());
                self.reload(backend, session).await;
                Outcome::Done
            }
            Err(e) => {
                self.surface("Deleting an event", e);
                Outcome::Failed
            }
        }
    }

    /// Copy a row of the current snapshot into the form and make it the edit target.
    /// Returns false if the row is not in the snapshot.
    pub fn start_edit(&mut self, id: i64) -> bool {
        match self.events.iter().find(|e| e.id == id) {
            Some(event) => {
                self.form = EventForm::from_event(event);
                self.edit_target = Some(id);
                true
            }
            None => false,
        }
    }
}
