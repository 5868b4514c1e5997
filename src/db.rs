//! PostgreSQL pool setup for the shop and search log tables.
//!
//! Schema lives in `migrations/` and is embedded into the binary at compile
//! time, so a fresh database is brought up to date on startup.

use sqlx::{Pool, Postgres, postgres::PgPoolOptions};

/// Shared connection pool handed to [`crate::repository::PgRepository`].
pub type DbPool = Pool<Postgres>;

/// Connect to PostgreSQL and apply any pending migrations.
///
/// Translation requests each need one short-lived connection for the usage
/// increment and one for the log write, so a small pool is enough.
///
/// # Errors
///
/// Returns an error if the connection string is invalid, the server is
/// unreachable, or a migration fails to apply.
pub async fn connect(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    tracing::info!("Database pool created");

    // Applied migrations are tracked in `_sqlx_migrations`
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations complete");

    Ok(pool)
}
