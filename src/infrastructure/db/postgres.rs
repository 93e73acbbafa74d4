use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};
use std::time::Duration;

const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Connects to Postgres with exponential backoff and applies pending
/// migrations.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let mut attempt = 0;
    let mut wait_seconds = 2;

    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) if attempt < MAX_CONNECT_ATTEMPTS => {
                attempt += 1;
                warn!(
                    "Failed to connect to project database (attempt {}/{}): {}. Retrying in {}s...",
                    attempt, MAX_CONNECT_ATTEMPTS, e, wait_seconds
                );
                tokio::time::sleep(Duration::from_secs(wait_seconds)).await;
                wait_seconds *= 2;
            }
            Err(e) => return Err(e.into()),
        }
    };

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Project database ready.");

    Ok(pool)
}
