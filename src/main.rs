//! Vertere Search - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Build the translation client
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use vertere_search::{
    AppState, config::Config, create_router, db, repository::PgRepository,
    services::translator::Translator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(model = %config.groq_model, "Configuration loaded");

    let pool = db::connect(&config.database_url).await?;

    let translator = Translator::new(&config)?;

    let state = AppState {
        repo: Arc::new(PgRepository::new(pool)),
        translator: Arc::new(translator),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
