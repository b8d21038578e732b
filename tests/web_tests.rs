mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use common::{credentials, sign_up, with_memory};
use eventboard::components::{IdentityService, InMemoryBackend};
use eventboard::config::{BackendKind, Config};
use eventboard::session::cookie::SESSION_COOKIE;
use eventboard::web::{self, AppState};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    state: AppState,
    memory: Arc<InMemoryBackend>,
}

impl TestApp {
    fn new(memory: InMemoryBackend) -> Self {
        let config = Config {
            backend: BackendKind::Memory,
            session_secret: "test-secret".to_string(),
            ..Default::default()
        };
        let (memory, backend) = with_memory(memory);
        let state = AppState::new(&config, backend);
        let app = web::router(state.clone(), &config.assets_dir);
        Self { app, state, memory }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// Sign in through the auth form and return the session cookie
    async fn sign_in(&self, email: &str) -> String {
        let form = format!("mode=sign_in&email={}&password=secret123", email.replace('@', "%40"));
        let response = self.post("/auth", &form, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("sign-in sets the session cookie")
    }
}

/// `name=value` of the session cookie set by the response, if any
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", SESSION_COOKIE)))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_signed_out_visitor_sees_auth_panel() {
    let app = TestApp::new(InMemoryBackend::new());

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Welcome Back"));
    assert!(html.contains("href=\"/?mode=sign_up\""));

    let html = body_text(app.get("/?mode=sign_up", None).await).await;
    assert!(html.contains("Create an Account"));
    assert!(html.contains("Sign Up"));
}

#[tokio::test]
async fn test_sign_up_lands_on_board_with_notice() {
    let app = TestApp::new(InMemoryBackend::new());

    let response = app
        .post(
            "/auth",
            "mode=sign_up&email=ann%40example.com&password=secret123",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookie = session_cookie(&response).unwrap();

    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("My Events"));
    assert!(html.contains("Signup successful"));
    assert!(html.contains("<dialog"));

    // Alerts are shown once
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(!html.contains("<dialog"));
}

#[tokio::test]
async fn test_failed_sign_in_shows_error_inline() {
    let app = TestApp::new(InMemoryBackend::new());
    sign_up(&app.memory, "ann@example.com").await;

    let response = app
        .post(
            "/auth",
            "mode=sign_in&email=ann%40example.com&password=nope",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Invalid login credentials"));
    assert!(html.contains("value=\"ann@example.com\""));
    assert!(!html.contains("nope"));
}

#[tokio::test]
async fn test_event_pages_require_session() {
    let app = TestApp::new(InMemoryBackend::new());

    let response = app.post("/events", "title=Standup", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.get("/events/1/delete", Some("eventboard_session=forged")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.memory.store_calls(), 0);
}

#[tokio::test]
async fn test_event_crud_through_forms() {
    let app = TestApp::new(InMemoryBackend::new());
    let session = sign_up(&app.memory, "ann@example.com").await;
    let cookie = app.sign_in("ann@example.com").await;

    let response = app
        .post("/events", "title=Standup&date=2024-01-10&time=&location=", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Standup"));
    assert!(html.contains("2024-01-10"));
    assert!(html.contains("No location"));
    assert!(html.contains("No time"));
    assert!(!html.contains("line-through"));

    let id = app.memory.rows_for(session.user_id()).await[0].id;

    app.post(&format!("/events/{}/toggle", id), "", Some(&cookie)).await;
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("line-through"));
    assert!(html.contains("Uncheck"));

    app.get(&format!("/events/{}/edit", id), Some(&cookie)).await;
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Update Event"));
    assert!(html.contains("value=\"Standup\""));

    app.post("/events", "title=Retro&date=2024-01-10", Some(&cookie)).await;
    let rows = app.memory.rows_for(session.user_id()).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Retro");

    let html = body_text(app.get(&format!("/events/{}/delete", id), Some(&cookie)).await).await;
    assert!(html.contains("Delete this event?"));

    app.post(&format!("/events/{}/delete", id), "confirm=no", Some(&cookie)).await;
    assert_eq!(app.memory.rows_for(session.user_id()).await.len(), 1);

    app.post(&format!("/events/{}/delete", id), "confirm=yes", Some(&cookie)).await;
    assert!(app.memory.rows_for(session.user_id()).await.is_empty());
}

#[tokio::test]
async fn test_blank_title_alert() {
    let app = TestApp::new(InMemoryBackend::new());
    sign_up(&app.memory, "ann@example.com").await;
    let cookie = app.sign_in("ann@example.com").await;

    app.post("/events", "title=&location=Room+1", Some(&cookie)).await;
    let html = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(html.contains("Title required"));
    assert!(html.contains("value=\"Room 1\""));
}

#[tokio::test]
async fn test_expiring_session_cookie_is_reissued() {
    let app = TestApp::new(InMemoryBackend::new().with_token_lifetime(0));
    app.memory
        .sign_up(&credentials("ann@example.com"))
        .await
        .unwrap();
    let cookie = app.sign_in("ann@example.com").await;

    let response = app.get("/", Some(&cookie)).await;
    let reissued = session_cookie(&response).expect("refreshed session is stored");
    assert_ne!(reissued, cookie);
    assert!(body_text(response).await.contains("My Events"));

    // The consumed refresh token cannot be used twice
    let response = app.get("/", Some(&cookie)).await;
    assert!(body_text(response).await.contains("Welcome Back"));

    let response = app.get("/", Some(&reissued)).await;
    assert!(body_text(response).await.contains("My Events"));
}

#[tokio::test]
async fn test_logout_clears_cookie_and_board() {
    let app = TestApp::new(InMemoryBackend::new());
    let session = sign_up(&app.memory, "ann@example.com").await;
    let cookie = app.sign_in("ann@example.com").await;
    app.get("/", Some(&cookie)).await;
    assert!(app.state.boards.contains(session.user_id()));

    let response = app.post("/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cleared = session_cookie(&response).unwrap();
    assert_eq!(cleared, format!("{}=", SESSION_COOKIE));
    assert!(!app.state.boards.contains(session.user_id()));
}

#[tokio::test]
async fn test_health_and_assets() {
    let app = TestApp::new(InMemoryBackend::new());

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");

    let response = app.get("/assets/eventboard.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
