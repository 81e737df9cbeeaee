use accounts_api::{
    config::{AppConfig, SessionConfig},
    db, routes,
    services::{create_email_service, AccountService, Clock, SystemClock, TokenPolicy},
    AppState,
};

use anyhow::Context;
use std::{sync::Arc, time::Duration};
use tower_http::cors::{Any, CorsLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "accounts_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let session_config = SessionConfig::from_env()?;

    // Database connection
    let pool = db::create_pool(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    db::run_migrations(&pool).await?;

    let email_service = create_email_service(&config.base_url, config.token_ttl_hours);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let policy = TokenPolicy::from_hours(config.token_ttl_hours);
    let app_state = AppState::build(pool.clone(), email_service, policy, clock);

    // Session store
    let session_store = SqliteStore::new(pool.clone())
        .with_table_name("sessions")
        .map_err(anyhow::Error::msg)?;
    session_store.migrate().await?;
    let session_layer = session_config.create_layer(session_store);

    spawn_token_purge(app_state.account_service.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = routes::build_router(app_state, session_layer).layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        "Listening on {} (token TTL {}h)",
        config.bind_addr,
        config.token_ttl_hours
    );
    axum::serve(listener, app).await?;

    Ok(())
}

/// Clears stale tokens once an hour for the life of the process.
fn spawn_token_purge(account_service: Arc<AccountService>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = account_service.purge_expired_tokens().await {
                tracing::warn!("Token purge failed: {}", e);
            }
        }
    });
}
