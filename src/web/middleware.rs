use super::state::AppState;
use crate::components::Session;
use crate::error::AppResult;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

/// Resolve the browser's session, refreshing it if needed.
/// The returned jar carries the re-issued or cleared cookie.
pub async fn resolve_session(
    state: &AppState,
    jar: CookieJar,
) -> AppResult<(CookieJar, Option<Session>)> {
    let stored = state.codec.read(&jar);
    let resolved = state.sessions.get_session(stored.clone()).await;

    let jar = match (&stored, &resolved) {
        (Some(old), Some(new)) if old != new => state.codec.store(jar, new)?,
        (Some(_), None) => state.codec.clear(jar),
        _ => jar,
    };
    Ok((jar, resolved))
}

/// Only lets requests with a valid session through; others go back to the auth panel
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let (jar, session) = resolve_session(&state, jar)
        .await
        .map_err(IntoResponse::into_response)?;

    match session {
        Some(session) => {
            req.extensions_mut().insert(session);
            Ok((jar, next.run(req).await).into_response())
        }
        None => Err((jar, Redirect::to("/")).into_response()),
    }
}
