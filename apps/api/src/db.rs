use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// The append-only conversation history table. One row per turn, never
/// updated or deleted; unbounded growth is accepted.
const CREATE_LESSON_HISTORY: &str = "
CREATE TABLE IF NOT EXISTS lesson_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT,
    role TEXT,
    content TEXT,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
)";

/// Creates a SQLite connection pool and ensures the schema exists.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database...");

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::query(CREATE_LESSON_HISTORY).execute(&pool).await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Single-connection in-memory pool with the schema applied. In-memory SQLite
/// gives every connection its own database, so the pool is capped at one.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").expect("in-memory options");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    sqlx::query(CREATE_LESSON_HISTORY)
        .execute(&pool)
        .await
        .expect("schema init");

    pool
}
