use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

/// Deletes CSRF state values that outlived `OAUTH_STATE_TTL_SECS`, for
/// logins that were started but never completed.
#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Pruning OAuth states older than {}s...",
        config.oauth_state_ttl_secs
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let app_state = service::AppState::new(config, &db);

    match domain::oauth_state::prune_expired(app_state.db_conn_ref(), &app_state.config).await {
        Ok(pruned) => info!("Done, {pruned} OAuth states removed"),
        Err(e) => {
            error!("Failed to prune OAuth states: {e}");
            std::process::exit(1);
        }
    }
}
