use crate::components::Backend;
use crate::config::Config;
use crate::error::{other_error, AppResult, Error};
use crate::shutdown;
use crate::utils::i18n;
use crate::web::{self, AppState};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| other_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the shared state and router for `config`
pub fn build_app(config: &Config) -> AppResult<axum::Router> {
    let backend = Backend::from_config(config)?;
    let state = AppState::new(config, backend);
    state.spawn_board_sweeper(Duration::from_secs(config.board_idle_timeout_secs));
    Ok(web::router(state, &config.assets_dir))
}

/// Serve the application until a shutdown signal arrives
pub async fn start_server(config: Config) -> miette::Result<()> {
    i18n::set_locale(&config.locale);

    let app = build_app(&config)?;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr).await.map_err(Error::from)?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_signal())
        .await
        .map_err(Error::from)?;

    info!("Server stopped");
    Ok(())
}
