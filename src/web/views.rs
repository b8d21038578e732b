use crate::components::Event;
use crate::error::AppResult;
use crate::panels::{AuthMode, AuthPanel, EventBoard, EventForm};
use askama::Template;
use axum::response::Html;
use rust_i18n::t;

/// Translated strings shared by all pages
pub struct Labels {
    pub app_title: String,
    pub auth_email: String,
    pub auth_password: String,
    pub auth_please_wait: String,
    pub board_title: String,
    pub board_signed_in: String,
    pub board_logout: String,
    pub board_loading: String,
    pub form_title_placeholder: String,
    pub form_description_placeholder: String,
    pub form_location_placeholder: String,
    pub event_edit: String,
    pub event_delete: String,
    pub alert_ok: String,
    pub delete_confirm: String,
    pub delete_confirm_yes: String,
    pub delete_confirm_no: String,
}

impl Labels {
    /// Labels in the active locale
    pub fn current() -> Self {
        Self {
            app_title: t!("app_title").to_string(),
            auth_email: t!("auth_email").to_string(),
            auth_password: t!("auth_password").to_string(),
            auth_please_wait: t!("auth_please_wait").to_string(),
            board_title: t!("board_title").to_string(),
            board_signed_in: t!("board_signed_in").to_string(),
            board_logout: t!("board_logout").to_string(),
            board_loading: t!("board_loading").to_string(),
            form_title_placeholder: t!("form_title_placeholder").to_string(),
            form_description_placeholder: t!("form_description_placeholder").to_string(),
            form_location_placeholder: t!("form_location_placeholder").to_string(),
            event_edit: t!("event_edit").to_string(),
            event_delete: t!("event_delete").to_string(),
            alert_ok: t!("alert_ok").to_string(),
            delete_confirm: t!("delete_confirm").to_string(),
            delete_confirm_yes: t!("delete_confirm_yes").to_string(),
            delete_confirm_no: t!("delete_confirm_no").to_string(),
        }
    }
}

/// A list item ready for display
pub struct EventView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub has_description: bool,
    pub location: String,
    pub date: String,
    pub time: String,
    pub completed: bool,
    pub toggle_label: String,
}

impl EventView {
    fn from_event(event: &Event) -> Self {
        let description = event.description.clone().unwrap_or_default();
        Self {
            id: event.id,
            title: event.title.clone(),
            has_description: !description.is_empty(),
            description,
            location: or_placeholder(&event.location, "event_no_location"),
            date: or_placeholder(&event.date, "event_no_date"),
            time: or_placeholder(&event.time, "event_no_time"),
            completed: event.completed,
            toggle_label: if event.completed {
                t!("event_uncheck").to_string()
            } else {
                t!("event_check").to_string()
            },
        }
    }
}

fn or_placeholder(value: &Option<String>, key: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => t!(key).to_string(),
    }
}

#[derive(Template)]
#[template(path = "auth.html")]
pub struct AuthPage {
    pub labels: Labels,
    pub heading: String,
    pub subtitle: String,
    pub submit_label: String,
    pub email: String,
    pub mode: &'static str,
    pub toggle_mode: &'static str,
    pub toggle_prompt: String,
    pub toggle_label: String,
    pub has_error: bool,
    pub error: String,
    pub has_notice: bool,
    pub notice: String,
}

impl AuthPage {
    pub fn new(panel: &AuthPanel) -> Self {
        let signing_up = panel.mode() == AuthMode::SignUp;
        let text = |sign_in: &str, sign_up: &str| {
            if signing_up {
                t!(sign_up).to_string()
            } else {
                t!(sign_in).to_string()
            }
        };

        Self {
            labels: Labels::current(),
            heading: text("auth_welcome_back", "auth_create_account"),
            subtitle: text("auth_sign_in_subtitle", "auth_sign_up_subtitle"),
            submit_label: text("auth_sign_in", "auth_sign_up"),
            email: panel.email.clone(),
            mode: panel.mode().as_str(),
            toggle_mode: panel.mode().toggled().as_str(),
            toggle_prompt: text("auth_no_account", "auth_have_account"),
            toggle_label: text("auth_switch_sign_up", "auth_switch_sign_in"),
            has_error: panel.error().is_some(),
            error: panel.error().unwrap_or_default().to_string(),
            has_notice: panel.notice().is_some(),
            notice: panel.notice().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardPage {
    pub labels: Labels,
    pub events: Vec<EventView>,
    pub form: EventForm,
    pub submit_label: String,
    pub loading: bool,
    pub alerts: Vec<String>,
}

impl BoardPage {
    /// Build the page; pending alerts are consumed
    pub fn new(board: &mut EventBoard) -> Self {
        let submit_label = match board.edit_target() {
            Some(_) => t!("form_update").to_string(),
            None => t!("form_add").to_string(),
        };
        Self {
            labels: Labels::current(),
            events: board.events().iter().map(EventView::from_event).collect(),
            form: board.form().clone(),
            submit_label,
            loading: board.is_loading(),
            alerts: board.take_alerts(),
        }
    }
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeletePage {
    pub labels: Labels,
    pub id: i64,
    pub title: String,
}

/// Render the auth panel
pub fn auth_page(panel: &AuthPanel) -> AppResult<Html<String>> {
    Ok(Html(AuthPage::new(panel).render()?))
}

/// Render the event board
pub fn board_page(board: &mut EventBoard) -> AppResult<Html<String>> {
    Ok(Html(BoardPage::new(board).render()?))
}

/// Render the delete confirmation prompt for one event
pub fn confirm_delete_page(event: &Event) -> AppResult<Html<String>> {
    let page = ConfirmDeletePage {
        labels: Labels::current(),
        id: event.id,
        title: event.title.clone(),
    };
    Ok(Html(page.render()?))
}
