use crate::components::Backend;
use crate::config::Config;
use crate::panels::EventBoard;
use crate::session::cookie::SessionCodec;
use crate::session::{AuthChangeEvent, SessionProvider, Subscription};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

type SharedBoard = Arc<tokio::sync::Mutex<EventBoard>>;

#[derive(Debug)]
struct BoardEntry {
    board: SharedBoard,
    last_used: Instant,
}

/// Event boards of signed-in users, keyed by user id
#[derive(Debug, Default)]
pub struct BoardRegistry {
    boards: Mutex<HashMap<String, BoardEntry>>,
}

impl BoardRegistry {
    /// The user's board, created empty on first use
    pub fn board_for(&self, user_id: &str) -> SharedBoard {
        let mut boards = self.boards.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = boards
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!("Creating event board for {}", user_id);
                BoardEntry {
                    board: Arc::new(tokio::sync::Mutex::new(EventBoard::new())),
                    last_used: Instant::now(),
                }
            });
        entry.last_used = Instant::now();
        entry.board.clone()
    }

    /// Drop boards nobody has touched for `max_idle`.
    /// Boards still held by a request are kept. Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut boards = self.boards.lock().unwrap_or_else(PoisonError::into_inner);
        let before = boards.len();
        boards.retain(|_, entry| {
            entry.last_used.elapsed() < max_idle || Arc::strong_count(&entry.board) > 1
        });
        before - boards.len()
    }

    /// Drop the user's board. Returns whether one existed.
    pub fn remove(&self, user_id: &str) -> bool {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
            .is_some()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared state of the web application
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub sessions: Arc<SessionProvider>,
    pub codec: Arc<SessionCodec>,
    pub boards: Arc<BoardRegistry>,
    _sign_out_listener: Arc<Subscription>,
}

impl AppState {
    /// Wire the session provider and board registry for `backend`.
    /// A user's board is discarded whenever they are signed out.
    pub fn new(config: &Config, backend: Backend) -> Self {
        let sessions = Arc::new(SessionProvider::new(
            backend.identity.clone(),
            config.session_refresh_margin_secs,
        ));
        let codec = Arc::new(SessionCodec::new(
            &config.session_secret,
            config.session_lifetime_days,
        ));
        let boards = Arc::new(BoardRegistry::default());

        let registry = Arc::downgrade(&boards);
        let subscription = sessions.on_auth_state_change(move |change| {
            if change.event != AuthChangeEvent::SignedOut {
                return;
            }
            if let Some(boards) = registry.upgrade() {
                if boards.remove(&change.user_id) {
                    debug!("Discarded event board of {}", change.user_id);
                }
            }
        });

        Self {
            backend,
            sessions,
            codec,
            boards,
            _sign_out_listener: Arc::new(subscription),
        }
    }

    /// Periodically drop boards idle for longer than `max_idle`.
    /// Covers users whose cookie simply expired without a sign-out.
    /// The task ends once the registry itself is gone.
    pub fn spawn_board_sweeper(&self, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let registry = Arc::downgrade(&self.boards);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(max_idle);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(boards) = registry.upgrade() else {
                    break;
                };
                let evicted = boards.evict_idle(max_idle);
                if evicted > 0 {
                    info!("Dropped {} idle event boards", evicted);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_board_is_shared_per_user() {
        let registry = BoardRegistry::default();
        let first = registry.board_for("user-1");
        first.lock().await.push_alert("hello");

        let again = registry.board_for("user-1");
        assert_eq!(again.lock().await.pending_alerts(), ["hello".to_string()]);
        assert!(registry.board_for("user-2").lock().await.pending_alerts().is_empty());

        assert!(registry.remove("user-1"));
        assert!(!registry.contains("user-1"));
        assert!(!registry.remove("user-1"));
    }

    #[tokio::test]
    async fn test_idle_boards_are_evicted() {
        let registry = BoardRegistry::default();
        registry.board_for("user-1");
        let held = registry.board_for("user-2");

        // Nothing has been idle for an hour yet
        assert_eq!(registry.evict_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 2);

        // Boards held by an in-flight request survive
        assert_eq!(registry.evict_idle(Duration::ZERO), 1);
        assert!(!registry.contains("user-1"));
        assert!(registry.contains("user-2"));

        drop(held);
        assert_eq!(registry.evict_idle(Duration::ZERO), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drops_idle_boards() {
        let state = AppState::new(
            &Config {
                session_secret: "test-secret".to_string(),
                ..Default::default()
            },
            Backend::shared(Arc::new(crate::components::InMemoryBackend::new())),
        );
        state.boards.board_for("user-1");

        let sweeper = state.spawn_board_sweeper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(state.boards.is_empty());
        sweeper.abort();
    }
}
