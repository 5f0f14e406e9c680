use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use std::time::Duration;

pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Path that selects a private in-memory database
pub const IN_MEMORY: &str = ":memory:";

pub fn create_pool(database_path: &str, max_connections: u32) -> Result<SqlitePool> {
    let (manager, max_size) = if database_path == IN_MEMORY {
        // every in-memory connection is its own database
        (SqliteConnectionManager::memory(), 1)
    } else {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }
        (
            SqliteConnectionManager::file(database_path),
            max_connections.max(1),
        )
    };

    let manager = manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_secs(30))
        .build(manager)
        .context("Failed to create SQLite connection pool")
}

pub fn init_schema(pool: &SqlitePool) -> Result<()> {
    let conn = pool.get().context("Failed to get connection from pool")?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            password TEXT NOT NULL,
            created TEXT NOT NULL,
            updated TEXT NOT NULL
        )
        "#,
        params![],
    )
    .context("Failed to create users table")?;

    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            address TEXT NOT NULL UNIQUE,
            created TEXT NOT NULL
        )
        "#,
        params![],
    )
    .context("Failed to create emails table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_emails_user_id ON emails(user_id)",
        params![],
    )
    .context("Failed to create user_id index")?;

    Ok(())
}
