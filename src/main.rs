use std::sync::Arc;

use anyhow::Context;
use notes_api::auth::TokenCodec;
use notes_api::database::{MemoryStore, PostgresStore};
use notes_api::middleware::RoutePolicy;
use notes_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = notes_api::config::config();

    tracing_subscriber::fmt::init();
    tracing::info!("Starting Notes API with {:?} policy profile", config.profile);

    let tokens = Arc::new(
        TokenCodec::from_config(&config.security)
            .context("token signing key must be configured (SECURITY_TOKEN_KEY)")?,
    );
    let policy = Arc::new(RoutePolicy::for_profile(config.profile));

    let state = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = Arc::new(
                PostgresStore::connect(&url, &config.database)
                    .await
                    .context("failed to connect to database")?,
            );
            AppState::new(store.clone(), store, tokens, policy)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, falling back to the in-memory store");
            let store = Arc::new(MemoryStore::new());
            AppState::new(store.clone(), store, tokens, policy)
        }
    };

    let app = notes_api::app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("NOTES_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Notes API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
