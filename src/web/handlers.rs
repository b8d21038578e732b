use super::middleware::resolve_session;
use super::state::AppState;
use super::views;
use crate::components::Session;
use crate::error::Error;
use crate::panels::{AuthMode, AuthOutcome, AuthPanel, Confirmation, EventForm};
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    #[serde(default)]
    pub mode: Option<AuthMode>,
}

/// Submitted auth panel
#[derive(Debug, Deserialize)]
pub struct AuthForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mode: AuthMode,
}

/// Answer from the delete confirmation page
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub confirm: String,
}

/// Auth panel without a session, event board with one
pub async fn index_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<IndexQuery>,
) -> Result<Response, Error> {
    let (jar, session) = resolve_session(&state, jar).await?;

    let Some(session) = session else {
        let panel = AuthPanel::new(query.mode.unwrap_or_default());
        return Ok((jar, views::auth_page(&panel)?).into_response());
    };

    let board = state.boards.board_for(session.user_id());
    let mut board = board.lock().await;
    board.mount(&state.backend, &session).await;
    Ok((jar, views::board_page(&mut board)?).into_response())
}

/// Sign in or sign up depending on the panel mode
pub async fn auth_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<AuthForm>,
) -> Result<Response, Error> {
    let mut panel = AuthPanel::with_input(form.mode, &form.email, &form.password);

    match panel.submit(&state.sessions).await {
        AuthOutcome::SignedIn(session) => {
            info!("Signed in {}", session.user_id());
            let jar = state.codec.store(jar, &session)?;
            if let Some(notice) = panel.notice() {
                let board = state.boards.board_for(session.user_id());
                board.lock().await.push_alert(notice);
            }
            Ok((jar, Redirect::to("/")).into_response())
        }
        AuthOutcome::SignedUp | AuthOutcome::Failed => {
            Ok((jar, views::auth_page(&panel)?).into_response())
        }
    }
}

/// Create a new event or save the one being edited
pub async fn submit_event_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<EventForm>,
) -> Redirect {
    let board = state.boards.board_for(session.user_id());
    let mut board = board.lock().await;
    board.set_form(form);
    let outcome = board.submit(&state.backend, &session).await;
    debug!("Event form submitted: {:?}", outcome);
    Redirect::to("/")
}

/// Load an event into the form
pub async fn edit_event_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Redirect {
    let board = state.boards.board_for(session.user_id());
    if !board.lock().await.start_edit(id) {
        debug!("Edit requested for event {} not on the board", id);
    }
    Redirect::to("/")
}

/// Flip the completed flag of an event
pub async fn toggle_event_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Redirect {
    let board = state.boards.board_for(session.user_id());
    let mut board = board.lock().await;
    board.toggle_complete(&state.backend, &session, id).await;
    Redirect::to("/")
}

/// Ask before deleting an event
pub async fn confirm_delete_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Response, Error> {
    let board = state.boards.board_for(session.user_id());
    let board = board.lock().await;
    match board.events().iter().find(|e| e.id == id) {
        Some(event) => Ok(views::confirm_delete_page(event)?.into_response()),
        None => Ok(Redirect::to("/").into_response()),
    }
}

/// Delete an event if the user confirmed
pub async fn delete_event_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Form(form): Form<DeleteForm>,
) -> Redirect {
    let confirmation = if form.confirm == "yes" {
        Confirmation::Accepted
    } else {
        Confirmation::Declined
    };

    let board = state.boards.board_for(session.user_id());
    let mut board = board.lock().await;
    board
        .delete(&state.backend, &session, id, confirmation)
        .await;
    Redirect::to("/")
}

/// End the session and return to the auth panel
pub async fn logout_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session) = state.codec.read(&jar) {
        // The cookie is cleared even when the service call fails
        let _ = state.sessions.sign_out(&session).await;
    }
    (state.codec.clear(jar), Redirect::to("/"))
}

/// Health check endpoint
pub async fn health_handler() -> &'static str {
    "OK"
}
