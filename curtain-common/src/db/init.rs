//! Database initialization
//!
//! Opens (creating if needed) the pipeline database and makes sure every table
//! exists. All table creation is idempotent, so this runs on every startup.

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path, config: &DatabaseConfig) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_millis(config.busy_timeout_ms))
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    info!(
        "Database busy timeout set to {} ms",
        config.busy_timeout_ms
    );

    Ok(pool)
}

/// Create every pipeline table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_customer_table(pool).await?;
    create_orders_table(pool).await?;
    create_measurement_table(pool).await?;
    create_manufacturing_status_table(pool).await?;
    create_delivery_table(pool).await?;
    create_role_credentials_table(pool).await?;
    Ok(())
}

/// Customers registered by Marketing
pub async fn create_customer_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customer (
            customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_name TEXT NOT NULL,
            phone_no TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Orders placed by a Salesperson for an existing customer
pub async fn create_orders_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            order_id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL REFERENCES customer(customer_id),
            type TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            address TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Measurement stage (one row per order, keyed by order_id)
pub async fn create_measurement_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS measurement (
            order_id INTEGER PRIMARY KEY REFERENCES orders(order_id),
            shade TEXT NOT NULL,
            dimensions TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Manufacturing stage (one row per order, keyed by order_id)
pub async fn create_manufacturing_status_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manufacturing_status (
            order_id INTEGER PRIMARY KEY REFERENCES orders(order_id),
            ready TEXT NOT NULL CHECK (ready IN ('Yes', 'No')),
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Delivery stage (one row per order, keyed by order_id)
///
/// `date` is present exactly when `status` is 'Delivered'.
pub async fn create_delivery_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS delivery (
            order_id INTEGER PRIMARY KEY REFERENCES orders(order_id),
            status TEXT NOT NULL,
            date TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK ((status = 'Delivered') = (date IS NOT NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Role Gate credential digests
pub async fn create_role_credentials_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS role_credentials (
            role TEXT PRIMARY KEY,
            credential_hash TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
