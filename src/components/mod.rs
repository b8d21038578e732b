use crate::config::{BackendKind, Config};
use crate::error::AppResult;
use std::sync::Arc;
use tracing::info;

pub mod identity;
pub mod memory;
pub mod store;
pub mod supabase;

pub use identity::{Credentials, IdentityService, Session, SignUpOutcome, User};
pub use memory::InMemoryBackend;
pub use store::{Event, EventChanges, EventStore, NewEvent};
pub use supabase::SupabaseClient;

/// The two halves of the hosted backend the client talks to
#[derive(Clone)]
pub struct Backend {
    pub identity: Arc<dyn IdentityService>,
    pub store: Arc<dyn EventStore>,
}

impl Backend {
    /// Bundle an identity service and a row store
    pub fn new(identity: Arc<dyn IdentityService>, store: Arc<dyn EventStore>) -> Self {
        Self { identity, store }
    }

    /// Use one value for both identity and storage
    pub fn shared<B: IdentityService + EventStore>(backend: Arc<B>) -> Self {
        Self {
            identity: backend.clone(),
            store: backend,
        }
    }

    /// Build the backend selected by the configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        match config.backend {
            BackendKind::Supabase => {
                info!("Using hosted backend at {}", config.supabase_url);
                let client = SupabaseClient::new(
                    &config.supabase_url,
                    &config.supabase_anon_key,
                    &config.events_table,
                )?;
                Ok(Self::shared(Arc::new(client)))
            }
            BackendKind::Memory => {
                info!("Using in-memory backend, data is lost on restart");
                Ok(Self::shared(Arc::new(InMemoryBackend::new())))
            }
        }
    }
}
