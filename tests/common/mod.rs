#![allow(dead_code)]

use eventboard::components::{
    Backend, Credentials, IdentityService, InMemoryBackend, Session,
};
use eventboard::panels::{EventBoard, EventForm};
use std::sync::Arc;

/// Credentials with a password the in-memory service accepts
pub fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: "secret123".to_string(),
    }
}

/// An in-memory backend and the handle the board uses
pub fn memory_backend() -> (Arc<InMemoryBackend>, Backend) {
    with_memory(InMemoryBackend::new())
}

pub fn with_memory(memory: InMemoryBackend) -> (Arc<InMemoryBackend>, Backend) {
    let memory = Arc::new(memory);
    let backend = Backend::shared(memory.clone());
    (memory, backend)
}

/// Register `email` and return its session
pub async fn sign_up(memory: &InMemoryBackend, email: &str) -> Session {
    memory
        .sign_up(&credentials(email))
        .await
        .expect("sign-up should succeed")
        .session
        .expect("autoconfirmed sign-up returns a session")
}

/// Form with only a title and date filled in
pub fn titled(title: &str, date: &str) -> EventForm {
    EventForm {
        title: title.to_string(),
        date: date.to_string(),
        ..Default::default()
    }
}

/// Fill in the form and submit it
pub async fn add_event(board: &mut EventBoard, backend: &Backend, session: &Session, title: &str) {
    board.set_form(titled(title, ""));
    board.submit(backend, session).await;
}
